//! Dataset commands.

use crate::cli::{DataAction, DataArgs};
use crate::client::CasparClient;
use crate::error::ClientResult;

use super::print_lines;

pub async fn run(client: &CasparClient, action: &DataAction, json: bool) -> ClientResult<()> {
    match action {
        DataAction::List => print_lines(&client.data_list().await?, json),
        DataAction::Retrieve { name } => print_lines(&client.data_retrieve(name).await?, json),
        DataAction::Store { name, data } => store(client, name, data).await,
        DataAction::Remove { name } => {
            client.data_remove(name).await?;
            println!("removed {}", name);
            Ok(())
        }
    }
}

async fn store(client: &CasparClient, name: &str, data: &DataArgs) -> ClientResult<()> {
    let payload = data.required_payload()?;
    client.data_store(name, &payload).await?;
    println!("stored {}", name);
    Ok(())
}
