use crate::lobby::Lobby;

#[derive(Clone)]
pub struct AppState {
    pub lobby: Lobby,
}
