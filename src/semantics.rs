//! Queries over decoded replays

use crate::{LuaData, LuaTable, Replay, ReplayInputKind};
use serde::Serialize;

/// The sim callback that carries chat between players
const CHAT_ENDPOINT: &str = "GiveResourcesToPlayer";

/// A chat message sent during a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayChatMessage {
    pub tick: i32,
    pub sender: String,
    pub receiver: String,
    pub text: String,
}

/// Lua values used as names are either strings or army numbers
fn lua_text(data: Option<&LuaData>) -> Option<String> {
    match data? {
        LuaData::String(x) => Some(x.clone()),
        LuaData::Number(x) => Some(format!("{}", x)),
        _ => None,
    }
}

fn chat_message(tick: i32, params: &LuaTable) -> Option<ReplayChatMessage> {
    let msg = params.get_table("Msg")?;
    let text = msg.get_str("text")?.to_string();
    let receiver = lua_text(msg.get("to")).unwrap_or_default();
    let sender = lua_text(params.get("Sender"))
        .or_else(|| lua_text(params.get("From")))
        .unwrap_or_default();

    Some(ReplayChatMessage {
        tick,
        sender,
        receiver,
        text,
    })
}

/// Collect the chat messages of a replay in the order they were sent.
///
/// Chat is relayed through resource transfer callbacks that carry a `Msg`
/// table; transfers without one are skipped.
pub fn chat_messages(replay: &Replay) -> Vec<ReplayChatMessage> {
    replay
        .body
        .user_input
        .iter()
        .filter_map(|input| match &input.kind {
            ReplayInputKind::SimCallback {
                endpoint,
                lua_parameters,
                ..
            } if endpoint == CHAT_ENDPOINT => chat_message(input.tick, lua_parameters.as_table()?),
            _ => None,
        })
        .collect()
}
