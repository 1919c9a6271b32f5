//! Template graphics commands.

use tracing::debug;

use crate::cli::CgAction;
use crate::client::CasparClient;
use crate::error::ClientResult;

use super::print_lines;

pub async fn run(client: &CasparClient, action: &CgAction, json: bool) -> ClientResult<()> {
    debug!(?action, "running cg command");
    match action {
        CgAction::Add {
            address,
            cg_layer,
            template,
            play,
            data,
        } => {
            let payload = data.payload()?;
            client
                .cg_add(*address, *cg_layer, template, *play, payload.as_ref())
                .await?;
        }
        CgAction::Play { address, cg_layer } => client.cg_play(*address, *cg_layer).await?,
        CgAction::Stop { address, cg_layer } => client.cg_stop(*address, *cg_layer).await?,
        CgAction::Next { address, cg_layer } => client.cg_next(*address, *cg_layer).await?,
        CgAction::Remove { address, cg_layer } => client.cg_remove(*address, *cg_layer).await?,
        CgAction::Clear { address } => client.cg_clear(*address).await?,
        CgAction::Update {
            address,
            cg_layer,
            data,
        } => {
            let payload = data.required_payload()?;
            client.cg_update(*address, *cg_layer, &payload).await?;
        }
        CgAction::Invoke {
            address,
            cg_layer,
            method,
        } => print_lines(&client.cg_invoke(*address, *cg_layer, method).await?, json)?,
        CgAction::Info { address, cg_layer } => {
            print_lines(&client.cg_info(*address, *cg_layer).await?, json)?
        }
    }
    Ok(())
}
