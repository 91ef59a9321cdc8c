pub mod crawler;
pub mod error;
pub mod models;
pub mod tree;
pub mod utils;

pub use crawler::{PageFetcher, SanjiangCrawler, SanjiangParser};
pub use error::FetchError;
pub use models::{NovelItem, WeekData};
pub use tree::{SanjiangTreeProvider, TreeItem, TreeItemKind};
pub use utils::ask_yes_no;
