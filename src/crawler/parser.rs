use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::models::{NovelItem, WeekData};

/// 三江页面HTML解析器
///
/// 解析永不失败：页面结构变化只会导致对应字段缺失或条目被跳过，
/// 一条数据都解析不出来时返回单条"暂无数据"提示，保证调用方拿到的
/// 列表始终非空。
pub struct SanjiangParser;

impl SanjiangParser {
    pub fn parse_weeks(&self, html: &str) -> Vec<WeekData> {
        let document = Html::parse_document(html);
        let mut week_data_list = Vec::new();

        info!("HTML长度: {} 字符", html.len());

        // 每周的数据在 <li class="strongrec-list book-list-wrap"> 中
        let week_selector = Selector::parse(".strongrec-list.book-list-wrap").unwrap();
        let week_elements: Vec<_> = document.select(&week_selector).collect();
        info!("找到 {} 个周数据", week_elements.len());

        for (index, week_element) in week_elements.iter().enumerate() {
            if let Some(week_data) = self.parse_week(*week_element, index) {
                week_data_list.push(week_data);
            }
        }

        if week_data_list.is_empty() {
            self.log_extraction_failure(html);
            week_data_list.push(placeholder_week());
        } else {
            info!("成功解析 {} 周的数据", week_data_list.len());
        }

        week_data_list
    }

    fn parse_week(&self, week_element: ElementRef, index: usize) -> Option<WeekData> {
        let date_from_selector = Selector::parse(".date-range-title .date-from").unwrap();
        let date_to_selector = Selector::parse(".date-range-title .date-to").unwrap();
        let book_selector = Selector::parse(".book-list ul li").unwrap();

        // 周标题（日期范围），缺失的一侧按空字符串处理
        let date_from = trimmed_text(week_element.select(&date_from_selector).next());
        let date_to = trimmed_text(week_element.select(&date_to_selector).next());
        let week_label = format!("{} - {}", date_from, date_to);

        info!("第 {} 周: {}", index + 1, week_label);

        let book_elements: Vec<_> = week_element.select(&book_selector).collect();
        info!("第 {} 周找到 {} 本小说", index + 1, book_elements.len());

        let mut novels = Vec::new();
        for book_element in book_elements {
            if let Some(novel) = self.parse_novel(book_element) {
                novels.push(novel);
            }
        }

        // 没有解析出小说的周直接丢弃，避免页面局部改版产生空分组
        if week_label.is_empty() || novels.is_empty() {
            return None;
        }

        Some(WeekData { week_label, novels })
    }

    fn parse_novel(&self, book_element: ElementRef) -> Option<NovelItem> {
        let title_selector = Selector::parse("h2 a.name").unwrap();
        let category_selector = Selector::parse("a.channel").unwrap();
        let tag_selector = Selector::parse("span.rec").unwrap();

        let title_link = book_element.select(&title_selector).next()?;
        let title = title_link.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            // 无标题的条目跳过，不视为错误
            return None;
        }

        // 页面上的链接是协议相对形式（//...），补全为https
        let url = title_link.value().attr("href").map(|href| {
            if href.starts_with("http") {
                href.to_string()
            } else {
                format!("https:{}", href)
            }
        });

        let category = book_element
            .select(&category_selector)
            .next()
            .map(|element| {
                element
                    .text()
                    .collect::<String>()
                    .replace("「", "")
                    .replace("」", "")
                    .trim()
                    .to_string()
            })
            .filter(|text| !text.is_empty());

        let tag = book_element
            .select(&tag_selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty());

        info!(
            "  - {} [{}] {}",
            title,
            category.as_deref().unwrap_or(""),
            tag.as_deref().unwrap_or("")
        );

        Some(NovelItem {
            title,
            author: None,
            url,
            category,
            tag,
        })
    }

    // 区分"页面结构变化"、"被反爬虫拦截"和"返回了无关内容"
    fn log_extraction_failure(&self, html: &str) {
        warn!("未能解析到数据，可能原因：网站返回内容不完整、页面结构已变化或被反爬虫机制拦截");
        warn!("HTML是否包含\"三江\": {}", html.contains("三江"));
        warn!("HTML是否包含\"strongrec\": {}", html.contains("strongrec"));
        warn!("HTML是否包含\"book-list\": {}", html.contains("book-list"));
    }
}

fn trimmed_text(element: Option<ElementRef>) -> String {
    element
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn placeholder_week() -> WeekData {
    WeekData {
        week_label: "暂无数据".to_string(),
        novels: vec![NovelItem {
            title: "未能从页面中获取到小说数据，请查看日志".to_string(),
            author: None,
            url: None,
            category: Some("提示".to_string()),
            tag: None,
        }],
    }
}
