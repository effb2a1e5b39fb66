use serde_json::json;

use crate::cli::OutputFormat;
use crate::database::{PgStore, VideoQuery};
use crate::filter::Filter;
use crate::policy::PolicyResolver;

/// Resolve the policy a user's requests would get and show the video filter it produces
pub async fn handle(user_id: &str, child: Option<&str>, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = PgStore::new();
    let viewer = PolicyResolver::new(&store)
        .viewer(Some(user_id.to_string()), child)
        .await?;

    let mut filter = Filter::new("videos")?;
    filter.assign(VideoQuery::visible_to(&viewer.scope).to_filter_data())?;
    let sql = filter.to_sql()?;

    match output_format {
        OutputFormat::Json => {
            let output = json!({
                "user_id": user_id,
                "active_child_id": viewer.active_child_id(),
                "clauses": viewer.clauses(),
                "sql": sql.query,
                "params": sql.params,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            match viewer.active_child_id() {
                Some(child_id) => println!("Active child: {}", child_id),
                None => println!("Active child: none (unrestricted)"),
            }
            for clause in viewer.clauses() {
                println!("  {}", serde_json::to_string(&clause)?);
            }
            println!("SQL: {}", sql.query);
            println!("Params: {}", serde_json::to_string(&sql.params)?);
        }
    }

    Ok(())
}
