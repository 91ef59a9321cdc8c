pub mod parser;

pub use parser::SanjiangParser;

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue, REFERER};
use tracing::info;

use crate::error::FetchError;
use crate::models::WeekData;

const SANJIANG_URL: &str = "https://www.qidian.com/sanjiang/";

// 起点对非浏览器UA会返回不完整内容，请求头需要尽量贴近真实浏览器
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 页面获取接口，树适配器通过它触发网络请求，测试中可替换为模拟实现
pub trait PageFetcher {
    async fn fetch_page(&self) -> Result<String, FetchError>;
}

pub struct SanjiangCrawler {
    client: reqwest::Client,
    url: String,
    parser: SanjiangParser,
}

impl SanjiangCrawler {
    pub fn new() -> Self {
        Self::with_url(SANJIANG_URL)
    }

    /// 指定目标页面地址（镜像站点或测试服务器使用）
    pub fn with_url(url: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        headers.insert(REFERER, HeaderValue::from_static("https://www.qidian.com/"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        Self {
            client,
            url: url.into(),
            parser: SanjiangParser,
        }
    }

    /// 获取三江页面原始HTML。单次请求，不重试，失败直接上抛给调用方
    pub async fn fetch_page(&self) -> Result<String, FetchError> {
        info!("正在获取: {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        info!("网络请求状态码: {}", status);

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    /// 获取并解析周推数据
    pub async fn fetch_weeks(&self) -> Result<Vec<WeekData>, FetchError> {
        let html = self.fetch_page().await?;
        Ok(self.parser.parse_weeks(&html))
    }
}

impl PageFetcher for SanjiangCrawler {
    async fn fetch_page(&self) -> Result<String, FetchError> {
        SanjiangCrawler::fetch_page(self).await
    }
}
