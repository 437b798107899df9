use crate::queue::PlayerId;

// Renders "@alice, @bob" style mention lists.
pub fn join_players(separator: &str, players: &[PlayerId]) -> String {
    players
        .iter()
        .map(|player| format!("@{}", player))
        .collect::<Vec<_>>()
        .join(separator)
}
