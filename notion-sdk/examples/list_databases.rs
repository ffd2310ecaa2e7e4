//! List Databases Example
//!
//! This example lists every database shared with an integration, following
//! pagination cursors, then queries the first one.
//!
//! To run this example:
//! ```
//! NOTION_API_TOKEN=secret_... cargo run --example list_databases
//! ```

use std::time::Duration;

use notion_sdk::{
    notion::{DatabaseQuery, Pagination, Sort, SortDirection},
    notion_client, ClientError, RequestContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    println!("Notion List Databases Example");

    // Token, root URL and version come from NOTION_* environment variables
    let client = notion_client().timeout(Duration::from_secs(10)).build()?;

    let mut page = Pagination::with_page_size(20);
    let mut databases = Vec::new();

    loop {
        let list = client.list_databases(&page).await?;
        databases.extend(list.results);

        match list.next_cursor {
            Some(cursor) if list.has_more => page = page.next(cursor),
            _ => break,
        }
    }

    println!("Found {} databases", databases.len());
    for database in &databases {
        println!("  {} {}", database.id, database.title_text());
    }

    let Some(first) = databases.first() else {
        return Ok(());
    };

    let query = DatabaseQuery {
        sorts: vec![Sort {
            property: None,
            timestamp: Some("last_edited_time".to_string()),
            direction: SortDirection::Descending,
        }],
        page: Pagination::with_page_size(5),
        ..Default::default()
    };
    let ctx = RequestContext::background().with_timeout(Duration::from_secs(5));

    match client.query_database_with_context(&ctx, &first.id, &query).await {
        Ok(pages) => {
            println!("Most recently edited pages of {}:", first.title_text());
            for page in pages.results {
                println!("  {}", page.id);
            }
        }
        Err(ClientError::Application { failure, .. }) => {
            eprintln!("Notion rejected the query: {}", failure);
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
