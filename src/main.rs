use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use sanjiang_fetch::{SanjiangCrawler, SanjiangTreeProvider, TreeItem, ask_yes_no};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let json_mode = std::env::args().any(|arg| arg == "--json");
    let provider = SanjiangTreeProvider::new(SanjiangCrawler::new());

    loop {
        println!("\n=== 起点三江周推 ===");
        provider.refresh().await;

        if let Some(message) = provider.last_error() {
            eprintln!("加载失败: {}", message);
        }

        if json_mode {
            println!("{}", serde_json::to_string_pretty(&provider.weeks())?);
        } else {
            print_tree(&provider.root_items());
        }

        if !ask_yes_no("\n是否重新加载? (y/n): ")? {
            break;
        }
    }

    println!("程序结束。");
    Ok(())
}

fn print_tree(items: &[TreeItem]) {
    for (week_index, week) in items.iter().enumerate() {
        println!("{}", week.label);
        for (novel_index, novel) in week.children.iter().enumerate() {
            let connector = if novel_index + 1 == week.children.len() {
                "└──"
            } else {
                "├──"
            };
            match &novel.description {
                Some(description) => println!("  {} {} {}", connector, novel.label, description),
                None => println!("  {} {}", connector, novel.label),
            }
        }
        if week_index + 1 < items.len() {
            println!();
        }
    }
}
