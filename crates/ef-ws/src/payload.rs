//! Outbound event payloads
//!
//! The feed replays a fixed list of event identifiers, one JSON text
//! frame per identifier, in order, forever.

use serde::Serialize;

/// Event identifiers replayed to every connected peer, in send order
pub const EVENT_IDS: [&str; 5] = [
    "000003dcad81050de3a507b37c929a68cad06711b3993d67ccc43da766e1593c",
    "00000147028ba43a4d73d2b86e972248739a50bd7983ac0f9498e5a1b30c2bdf",
    "000001ed5df72d80e42c6be870c33fe1e2a8274a41a91467f5e4f25a401aaaef",
    "000002098eda9a22879715ff9dd9c1fd8584fe93a88e35ea0090e2334ce417df",
    "00000142bb9b3a25ba093afe5c5cad46dfc1965f34735f1b841f461f0d612595",
];

/// One outbound event frame: `{"eventId":"<id>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventFrame<'a> {
    #[serde(rename = "eventId")]
    pub event_id: &'a str,
}

impl<'a> EventFrame<'a> {
    pub fn new(event_id: &'a str) -> Self {
        Self { event_id }
    }

    /// Serialize to the compact JSON text sent on the wire
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Endless iterator over the event frames, starting at the first identifier
pub fn event_cycle() -> impl Iterator<Item = EventFrame<'static>> {
    EVENT_IDS.iter().copied().cycle().map(EventFrame::new)
}
