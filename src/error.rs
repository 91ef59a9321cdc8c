use thiserror::Error;

/// 网络层错误：连接失败、超时或非2xx状态码。
/// 解析阶段不产生错误，页面结构变化只会导致数据降级。
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("网络请求失败: {0}")]
    Request(#[from] reqwest::Error),
    #[error("服务器返回状态码 {status}")]
    Status { status: u16 },
}
