use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::crawler::{PageFetcher, SanjiangParser};
use crate::models::{NovelItem, WeekData};

/// 树节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeItemKind {
    Week,
    Novel,
}

/// 树节点数据，宿主UI按原样渲染：周节点为可展开分组，小说节点为叶子
#[derive(Debug, Clone, PartialEq)]
pub struct TreeItem {
    pub label: String,
    pub kind: TreeItemKind,
    pub description: Option<String>, // 分类和标签装饰，例如：「仙侠」 爽文
    pub tooltip: Option<String>,
    pub url: Option<String>, // 存在时宿主绑定"在浏览器中打开"动作
    pub children: Vec<TreeItem>,
    pub expanded: bool,
}

impl TreeItem {
    fn week(label: String, children: Vec<TreeItem>) -> Self {
        Self {
            label,
            kind: TreeItemKind::Week,
            description: None,
            tooltip: None,
            url: None,
            expanded: !children.is_empty(),
            children,
        }
    }

    fn novel(novel: &NovelItem) -> Self {
        let mut desc_parts = Vec::new();
        if let Some(category) = &novel.category {
            desc_parts.push(format!("「{}」", category));
        }
        if let Some(tag) = &novel.tag {
            desc_parts.push(tag.clone());
        }
        let description = if desc_parts.is_empty() {
            None
        } else {
            Some(desc_parts.join(" "))
        };

        let mut tooltip = format!("**{}**\n\n", novel.title);
        if let Some(category) = &novel.category {
            tooltip.push_str(&format!("分类: {}\n\n", category));
        }
        if let Some(tag) = &novel.tag {
            tooltip.push_str(&format!("标签: {}\n\n", tag));
        }
        if let Some(url) = &novel.url {
            tooltip.push_str(&format!("[在浏览器中打开]({})", url));
        }

        Self {
            label: novel.title.clone(),
            kind: TreeItemKind::Novel,
            description,
            tooltip: Some(tooltip),
            url: novel.url.clone(),
            children: Vec::new(),
            expanded: false,
        }
    }
}

type Listener = Box<dyn Fn() + Send + Sync>;

struct TreeState {
    weeks: Vec<WeekData>,
    items: Vec<TreeItem>,
    last_error: Option<String>,
}

/// 三江周推树模型适配器
///
/// 持有最近一次刷新的结果，每次刷新整体替换（不做增量合并），
/// 重建后通知所有订阅者。刷新过程中再次触发的刷新会被直接忽略。
pub struct SanjiangTreeProvider<F: PageFetcher> {
    fetcher: F,
    parser: SanjiangParser,
    state: Mutex<TreeState>,
    listeners: Mutex<Vec<Listener>>,
    loading: AtomicBool,
}

impl<F: PageFetcher> SanjiangTreeProvider<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            parser: SanjiangParser,
            state: Mutex::new(TreeState {
                weeks: Vec::new(),
                items: Vec::new(),
                last_error: None,
            }),
            listeners: Mutex::new(Vec::new()),
            loading: AtomicBool::new(false),
        }
    }

    /// 订阅树更新通知，每次重建后回调
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners.lock().unwrap().push(Box::new(listener));
    }

    /// 刷新数据
    ///
    /// 网络失败不会从这里抛出：树被替换为单个"加载失败"节点，
    /// 错误信息通过 [`last_error`](Self::last_error) 暴露给宿主做提示。
    pub async fn refresh(&self) {
        // 协作式防重入，同一时刻只允许一次刷新在途
        if self.loading.swap(true, Ordering::SeqCst) {
            return;
        }

        let result = self.fetcher.fetch_page().await;
        {
            let mut state = self.state.lock().unwrap();
            match result {
                Ok(html) => {
                    let weeks = self.parser.parse_weeks(&html);
                    state.items = build_tree_items(&weeks);
                    state.weeks = weeks;
                    state.last_error = None;
                }
                Err(error) => {
                    warn!("加载三江数据失败: {}", error);
                    state.weeks.clear();
                    state.items = vec![load_failed_item()];
                    state.last_error = Some(error.to_string());
                }
            }
        }
        self.notify_listeners();
        self.loading.store(false, Ordering::SeqCst);
    }

    /// 根节点（周列表）快照
    pub fn root_items(&self) -> Vec<TreeItem> {
        self.state.lock().unwrap().items.clone()
    }

    /// 当前周数据快照
    pub fn weeks(&self) -> Vec<WeekData> {
        self.state.lock().unwrap().weeks.clone()
    }

    /// 最近一次刷新的失败原因，成功后清空
    pub fn last_error(&self) -> Option<String> {
        self.state.lock().unwrap().last_error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    fn notify_listeners(&self) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener();
        }
    }
}

fn build_tree_items(weeks: &[WeekData]) -> Vec<TreeItem> {
    weeks
        .iter()
        .map(|week| {
            let novels = week.novels.iter().map(TreeItem::novel).collect();
            TreeItem::week(
                format!("{} ({})", week.week_label, week.novels.len()),
                novels,
            )
        })
        .collect()
}

fn load_failed_item() -> TreeItem {
    TreeItem::week("加载失败".to_string(), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct MockFetcher {
        calls: AtomicUsize,
        delay: Option<Duration>,
        response: Mutex<Result<String, u16>>,
    }

    impl MockFetcher {
        fn ok(html: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: None,
                response: Mutex::new(Ok(html.to_string())),
            }
        }

        fn status(status: u16) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: None,
                response: Mutex::new(Err(status)),
            }
        }

        fn set_response(&self, response: Result<String, u16>) {
            *self.response.lock().unwrap() = response;
        }
    }

    impl PageFetcher for MockFetcher {
        async fn fetch_page(&self) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &*self.response.lock().unwrap() {
                Ok(html) => Ok(html.clone()),
                Err(status) => Err(FetchError::Status { status: *status }),
            }
        }
    }

    const PAGE: &str = "<html><body><ul>\
        <li class=\"strongrec-list book-list-wrap\">\
        <div class=\"date-range-title\">\
        <span class=\"date-from\">2025.10.26</span>\
        <span class=\"date-to\">2025.11.02</span>\
        </div>\
        <div class=\"book-list\"><ul>\
        <li><h2><a class=\"name\" href=\"//www.qidian.com/book/1/\">第一本</a></h2>\
        <a class=\"channel\">「仙侠」</a><span class=\"rec\">爽文</span></li>\
        <li><h2><a class=\"name\">第二本</a></h2></li>\
        </ul></div>\
        </li>\
        </ul></body></html>";

    #[tokio::test]
    async fn refresh_builds_week_and_novel_nodes() {
        let provider = SanjiangTreeProvider::new(MockFetcher::ok(PAGE));
        provider.refresh().await;

        let items = provider.root_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "2025.10.26 - 2025.11.02 (2)");
        assert_eq!(items[0].kind, TreeItemKind::Week);
        assert!(items[0].expanded);

        let novels = &items[0].children;
        assert_eq!(novels.len(), 2);
        assert_eq!(novels[0].label, "第一本");
        assert_eq!(novels[0].description.as_deref(), Some("「仙侠」 爽文"));
        assert_eq!(
            novels[0].url.as_deref(),
            Some("https://www.qidian.com/book/1/")
        );
        assert!(novels[1].description.is_none());
        assert!(novels[1].url.is_none());
        assert!(provider.last_error().is_none());
    }

    #[tokio::test]
    async fn fetch_failure_replaces_tree_with_placeholder() {
        let provider = SanjiangTreeProvider::new(MockFetcher::status(503));
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        provider.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        provider.refresh().await;

        let items = provider.root_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "加载失败");
        assert!(items[0].children.is_empty());
        assert!(!items[0].expanded);
        assert!(provider.weeks().is_empty());
        assert!(provider.last_error().unwrap().contains("503"));
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn successful_refresh_clears_previous_error() {
        let provider = SanjiangTreeProvider::new(MockFetcher::status(502));
        provider.refresh().await;
        assert!(provider.last_error().is_some());

        provider.fetcher.set_response(Ok(PAGE.to_string()));
        provider.refresh().await;

        assert!(provider.last_error().is_none());
        assert_eq!(provider.root_items()[0].label, "2025.10.26 - 2025.11.02 (2)");
    }

    #[tokio::test]
    async fn refresh_notifies_subscribers_on_success() {
        let provider = SanjiangTreeProvider::new(MockFetcher::ok(PAGE));
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        provider.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        provider.refresh().await;
        provider.refresh().await;

        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_while_loading_is_noop() {
        let fetcher = MockFetcher {
            calls: AtomicUsize::new(0),
            delay: Some(Duration::from_millis(50)),
            response: Mutex::new(Ok(PAGE.to_string())),
        };
        let provider = SanjiangTreeProvider::new(fetcher);

        tokio::join!(provider.refresh(), provider.refresh());

        assert_eq!(provider.fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(!provider.is_loading());
        assert_eq!(provider.root_items().len(), 1);
    }

    #[tokio::test]
    async fn unparseable_page_shows_no_data_placeholder() {
        let provider = SanjiangTreeProvider::new(MockFetcher::ok("<html><body>验证中</body></html>"));
        provider.refresh().await;

        let items = provider.root_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "暂无数据 (1)");
        assert_eq!(items[0].children.len(), 1);
        // 解析降级不算错误，错误通道只留给网络失败
        assert!(provider.last_error().is_none());
    }
}
