//! Print the OpenAPI document of the leaderboard API as pretty JSON.

use leaderboard_store::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    println!("{}", ApiDoc::openapi().to_pretty_json()?);
    Ok(())
}
