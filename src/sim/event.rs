/// Events emitted during a session tick.
/// The presentation layer consumes these for sound and HUD messages.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// Idle → Playing on the first confirm.
    Started,
    Jumped,
    DoubleJumped,
    Landed,
    Died,
    /// Player reset at the spawn point (after the death pause or a restart).
    Respawned,
    Won,
}
