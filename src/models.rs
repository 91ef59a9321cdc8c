use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NovelItem {
    pub title: String,
    pub author: Option<String>, // 预留字段，当前页面结构不提供作者信息
    pub url: Option<String>, // 绝对链接，协议相对链接已补全为https
    pub category: Option<String>, // 分类（如"奇幻"、"仙侠"）
    pub tag: Option<String>, // 推荐标签（如"冰汽"、"爽文"）
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekData {
    pub week_label: String, // 例如：2025.10.26 - 2025.11.02
    pub novels: Vec<NovelItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn novel_item_null_fields_deserialize_to_none() {
        let json = r#"{
            "title": "诡秘之主",
            "author": null,
            "url": "https://www.qidian.com/book/1010868264/",
            "category": "奇幻",
            "tag": null
        }"#;
        let parsed: NovelItem = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.title, "诡秘之主");
        assert!(parsed.author.is_none());
        assert_eq!(parsed.category.as_deref(), Some("奇幻"));
        assert!(parsed.tag.is_none());
    }
}
