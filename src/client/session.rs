//! Peer session: who simulates, who mirrors
//!
//! Exactly one peer holds the turn. That peer runs the [`GameLoop`] and
//! publishes deltas every frame; the other renders a [`MirroredState`]
//! written only by incoming messages. Authority moves on `switchPlayer`.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::client::inbox::Inbox;
use crate::client::mirror::MirroredState;
use crate::game::constants::net::ROOM_ID_LEN;
use crate::game::constants::timing::TICK_MS;
use crate::game::events::{GameEvent, GameOverNotice, TurnHandover};
use crate::game::game_loop::{GameLoop, GameLoopConfig};
use crate::game::state::{
    self, Ball, Brick, GuideLine, Millis, PlayerSlot, PowerUp, Projectile, ScoreDisplay,
};
use crate::net::delta::DeltaTracker;
use crate::net::protocol::{ClientMessage, GameSnapshot, ServerMessage};
use crate::util::weighted::WeightError;

const ROOM_ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Short lowercase alphanumeric room token
pub fn generate_room_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_ID_LEN)
        .filter_map(|_| ROOM_ID_CHARSET.choose(rng).map(|&c| c as char))
        .collect()
}

/// What a renderer needs for one frame
#[derive(Debug)]
pub struct FrameView<'a> {
    pub is_my_turn: bool,
    pub current_player: PlayerSlot,
    pub paddle_x: f32,
    pub balls: &'a [Ball],
    pub bricks: &'a [Brick],
    pub dropping_bricks: &'a [Brick],
    pub power_ups: &'a [PowerUp],
    pub projectiles: &'a [Projectile],
    pub guide_line: &'a GuideLine,
    pub scores: ScoreDisplay,
    pub level: u32,
    pub level_progress: f32,
    pub level_banner: bool,
    pub guns_active: bool,
    pub game_over: Option<&'a GameOverNotice>,
}

pub struct PeerSession {
    room_id: String,
    player: Option<PlayerSlot>,
    authoritative: bool,
    /// Joined on our own turn. Nothing is simulated or published until the
    /// relay's parity state (possibly empty) has been adopted.
    awaiting_resume: bool,
    sim: GameLoop,
    mirror: MirroredState,
    tracker: DeltaTracker,
    now_ms: Millis,
    last_error: Option<String>,
    game_over: Option<GameOverNotice>,
}

impl PeerSession {
    /// `room_id` falls back to a random token when absent or empty
    pub fn new(room_id: Option<String>, seed: Option<u64>) -> Result<Self, WeightError> {
        let room_id = room_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| generate_room_id(&mut rand::thread_rng()));
        let sim = GameLoop::new(GameLoopConfig {
            seed,
            ..Default::default()
        })?;
        let mirror = MirroredState::from_game_state(sim.state());
        Ok(Self {
            room_id,
            player: None,
            authoritative: false,
            awaiting_resume: false,
            sim,
            mirror,
            tracker: DeltaTracker::new(),
            now_ms: 0,
            last_error: None,
            game_over: None,
        })
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn player(&self) -> Option<PlayerSlot> {
        self.player
    }

    pub fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn game_over(&self) -> Option<&GameOverNotice> {
        self.game_over.as_ref()
    }

    pub fn now(&self) -> Millis {
        self.now_ms
    }

    pub fn join_message(&self) -> ClientMessage {
        ClientMessage::Join {
            room_id: self.room_id.clone(),
        }
    }

    /// Apply one relay message
    pub fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Joined {
                player,
                current_player,
            } => {
                self.player = Some(player);
                self.mirror.current_player = current_player;
                if player == current_player {
                    self.sim.state_mut().current_player = player;
                    self.authoritative = true;
                    self.awaiting_resume = true;
                    self.tracker.reset();
                } else {
                    self.authoritative = false;
                }
                info!(room = %self.room_id, %player, %current_player, "Joined");
            }
            ServerMessage::Error { message } => {
                warn!(room = %self.room_id, "Relay error: {}", message);
                self.last_error = Some(message);
            }
            ServerMessage::GameUpdateDelta { delta } => {
                if !self.authoritative {
                    self.mirror.apply_delta(&delta, self.now_ms);
                } else if self.awaiting_resume {
                    self.resume_from(&delta);
                } else {
                    debug!("Delta ignored while holding the turn");
                }
            }
            ServerMessage::SwitchPlayer(handover) => self.on_switch(handover),
            ServerMessage::LevelUp(advance) => {
                if !self.authoritative {
                    self.mirror.apply_level_up(&advance, self.now_ms);
                }
            }
            ServerMessage::GameOver(notice) => {
                self.sim.finish(notice.reason.clone());
                info!(score = notice.score, "{}", notice.reason.message());
                self.game_over = Some(notice);
            }
        }
    }

    fn on_switch(&mut self, handover: TurnHandover) {
        let Some(me) = self.player else {
            return;
        };
        if handover.current_player == me {
            if !self.authoritative {
                self.mirror.apply_turn_switch(&handover);
                self.take_turn(me);
            }
            return;
        }
        if self.authoritative {
            warn!(%me, "Turn claimed by the other player, yielding");
            self.yield_turn();
        }
        self.mirror.apply_turn_switch(&handover);
    }

    /// Rejoined a running match on our own turn
    fn resume_from(&mut self, delta: &GameSnapshot) {
        let Some(me) = self.player else {
            return;
        };
        self.mirror.apply_delta(delta, self.now_ms);
        self.take_turn(me);
        info!(%me, "Resumed turn from relay snapshot");
    }

    fn take_turn(&mut self, me: PlayerSlot) {
        self.sim.take_over(me, self.mirror.carry_over(), self.now_ms);
        self.tracker.reset();
        self.authoritative = true;
        self.awaiting_resume = false;
    }

    fn yield_turn(&mut self) {
        self.mirror = MirroredState::from_game_state(self.sim.state());
        self.authoritative = false;
        self.awaiting_resume = false;
    }

    /// One frame: drain inbound messages, then simulate or mirror. Returns
    /// what to send to the relay, in order.
    pub fn frame<I>(&mut self, incoming: I) -> Vec<ClientMessage>
    where
        I: IntoIterator<Item = ServerMessage>,
    {
        self.now_ms += TICK_MS;
        for message in incoming {
            self.handle_message(message);
        }

        let mut outgoing = Vec::new();
        if self.awaiting_resume {
            return outgoing;
        }
        if !self.authoritative || self.player.is_none() {
            self.mirror.advance(self.now_ms);
            return outgoing;
        }

        let events = self.sim.tick_at(self.now_ms);
        let snapshot = GameSnapshot::from_game_state(self.sim.state());
        if let Some(delta) = self.tracker.next_delta(&snapshot) {
            outgoing.push(ClientMessage::GameUpdate { game_state: delta });
        }

        let mut yielded = false;
        for event in events {
            match event {
                GameEvent::LevelUp(advance) => outgoing.push(ClientMessage::LevelUp(advance)),
                GameEvent::TurnEnded {
                    handover,
                    combo_bonus,
                } => {
                    debug!(combo_bonus, next = %handover.current_player, "Handing over turn");
                    outgoing.push(ClientMessage::SwitchPlayer(handover));
                    yielded = true;
                }
                GameEvent::GameOver(notice) => {
                    self.game_over = Some(notice.clone());
                    outgoing.push(ClientMessage::GameOver(notice));
                }
                _ => {}
            }
        }
        if yielded {
            self.yield_turn();
        }
        outgoing
    }

    fn simulating(&self) -> bool {
        self.authoritative && !self.awaiting_resume
    }

    /// One frame fed by everything the network task queued since the last one
    pub fn frame_from(&mut self, inbox: &Inbox) -> Vec<ClientMessage> {
        self.frame(inbox.drain())
    }

    /// Pointer moved over the field. Ignored while mirroring.
    pub fn pointer_moved(&mut self, x: f32) {
        if self.simulating() {
            self.sim.pointer_moved(x);
        }
    }

    /// Click launches the waiting ball
    pub fn click(&mut self) -> bool {
        self.simulating() && self.sim.launch()
    }

    pub fn fire(&mut self) -> bool {
        self.simulating() && self.sim.fire().is_some()
    }

    pub fn view(&self) -> FrameView<'_> {
        let is_my_turn = self.authoritative;
        if self.authoritative {
            let s = self.sim.state();
            FrameView {
                is_my_turn,
                current_player: s.current_player,
                paddle_x: s.paddle.x,
                balls: &s.balls,
                bricks: &s.bricks,
                dropping_bricks: &s.dropping_bricks,
                power_ups: &s.power_ups,
                projectiles: &s.projectiles,
                guide_line: &s.guide_line,
                scores: s.scores.display(),
                level: s.level,
                level_progress: s.level_progress(),
                level_banner: s.level_banner_active(),
                guns_active: s.guns.is_active(s.now_ms),
                game_over: self.game_over.as_ref(),
            }
        } else {
            let m = &self.mirror;
            FrameView {
                is_my_turn,
                current_player: m.current_player,
                paddle_x: m.paddle_x,
                balls: &m.balls,
                bricks: &m.bricks,
                dropping_bricks: &m.dropping_bricks,
                power_ups: &m.power_ups,
                projectiles: &m.projectiles,
                guide_line: &m.guide_line,
                scores: m.score_display.clone(),
                level: m.level,
                level_progress: state::level_progress(m.level),
                level_banner: m.level_banner_active(),
                guns_active: m.guns_active(),
                game_over: self.game_over.as_ref(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::field;
    use crate::game::state::GameOverReason;
    use crate::lobby::manager::LobbyManager;
    use crate::net::connection::ConnectionId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Two peers talking through an in-process lobby
    struct Table {
        lobby: LobbyManager,
        peers: Vec<PeerSession>,
        ids: Vec<ConnectionId>,
        inboxes: Vec<Inbox>,
    }

    impl Table {
        fn new(room: &str) -> Self {
            let mut table = Self {
                lobby: LobbyManager::new(10),
                peers: Vec::new(),
                ids: Vec::new(),
                inboxes: Vec::new(),
            };
            table.seat(room, 1);
            table.seat(room, 2);
            table
        }

        fn seat(&mut self, room: &str, seed: u64) -> usize {
            let peer = PeerSession::new(Some(room.into()), Some(seed)).unwrap();
            let join = peer.join_message();
            self.peers.push(peer);
            self.ids.push(ConnectionId::new());
            self.inboxes.push(Inbox::default());
            let index = self.peers.len() - 1;
            self.route(index, vec![join]);
            index
        }

        fn route(&mut self, from: usize, messages: Vec<ClientMessage>) {
            for message in messages {
                for out in self.lobby.handle(self.ids[from], message) {
                    if let Some(to) = self.ids.iter().position(|id| *id == out.to) {
                        self.inboxes[to].sender().try_send(out.message).unwrap();
                    }
                }
            }
        }

        fn step(&mut self) {
            for i in 0..self.peers.len() {
                let outgoing = self.peers[i].frame_from(&self.inboxes[i]);
                self.route(i, outgoing);
            }
        }

        fn drop_original_ball(&mut self, peer: usize) {
            let ball = self.peers[peer].sim.state_mut().original_ball_mut().unwrap();
            ball.x = 10.0;
            ball.y = field::HEIGHT + 1.0;
            ball.dy = 1.0;
        }
    }

    #[test]
    fn test_generate_room_id() {
        let mut rng = StdRng::seed_from_u64(3);
        let id = generate_room_id(&mut rng);
        assert_eq!(id.len(), ROOM_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));

        let peer = PeerSession::new(None, Some(1)).unwrap();
        assert_eq!(peer.room_id().len(), ROOM_ID_LEN);
        let peer = PeerSession::new(Some(String::new()), Some(1)).unwrap();
        assert_eq!(peer.room_id().len(), ROOM_ID_LEN);
    }

    #[test]
    fn test_first_peer_simulates_second_mirrors() {
        let mut table = Table::new("coop01");
        table.step();
        table.step();

        assert!(table.peers[0].is_authoritative());
        assert!(!table.peers[1].is_authoritative());
        assert_eq!(table.peers[1].player(), Some(PlayerSlot::Two));
        assert_eq!(
            table.peers[1].view().bricks,
            table.peers[0].sim.state().bricks.as_slice()
        );
    }

    #[test]
    fn test_mirror_ignores_input() {
        let mut table = Table::new("coop02");
        table.step();
        let before = table.peers[1].view().paddle_x;
        table.peers[1].pointer_moved(10.0);
        assert!(!table.peers[1].click());
        assert!(!table.peers[1].fire());
        assert_eq!(table.peers[1].view().paddle_x, before);
    }

    #[test]
    fn test_paddle_motion_reaches_mirror() {
        let mut table = Table::new("coop03");
        table.step();
        table.peers[0].click();
        table.peers[0].pointer_moved(200.0);
        table.step();
        table.step();
        let authority_x = table.peers[0].sim.state().paddle.x;
        assert_eq!(table.peers[1].view().paddle_x, authority_x);
    }

    #[test]
    fn test_turn_handover_moves_authority() {
        let mut table = Table::new("coop04");
        table.step();
        assert!(table.peers[0].click());
        table.drop_original_ball(0);

        // Peer 1 loses the ball and yields
        table.step();
        assert!(!table.peers[0].is_authoritative());
        // Peer 2 takes over on its next frame
        table.step();
        assert!(table.peers[1].is_authoritative());

        let new_authority = table.peers[1].sim.state();
        assert_eq!(new_authority.current_player, PlayerSlot::Two);
        assert!(new_authority.awaiting_launch());
        assert_eq!(new_authority.balls.len(), 1);
        assert_eq!(
            new_authority.bricks,
            table.peers[0].mirror.bricks,
            "both peers hold the post-shift layout"
        );
        assert_eq!(table.peers[0].view().current_player, PlayerSlot::Two);

        // And back again
        table.step();
        assert!(table.peers[1].click());
        table.drop_original_ball(1);
        table.step();
        table.step();
        assert!(table.peers[0].is_authoritative());
        assert_eq!(table.peers[0].sim.state().current_player, PlayerSlot::One);
    }

    #[test]
    fn test_breach_ends_match_on_both_peers() {
        let mut table = Table::new("coop05");
        table.step();
        let authority = table.peers[0].sim.state_mut();
        authority.bricks.push(Brick::new(27.5, 570.0, 1, 0));
        table.peers[0].click();
        table.drop_original_ball(0);
        table.step();
        table.step();
        table.step();

        for peer in &table.peers {
            let notice = peer.game_over().expect("game over seen");
            assert_eq!(notice.reason, GameOverReason::Blocks);
        }
        assert!(table.peers[1].sim.state().is_game_over);
    }

    #[test]
    fn test_rejoin_on_own_turn_resumes_relay_state() {
        let mut table = Table::new("coop06");
        table.step();
        table.step();
        let bricks = table.peers[0].sim.state().bricks.clone();

        // Player 1 drops out and a fresh client takes the seat
        table.lobby.leave_room(table.ids[0]).unwrap();
        let index = table.seat("coop06", 99);
        table.step();

        let rejoined = &table.peers[index];
        assert_eq!(rejoined.player(), Some(PlayerSlot::One));
        assert!(rejoined.is_authoritative());
        assert_eq!(rejoined.sim.state().bricks, bricks);
    }

    #[test]
    fn test_rejoin_waits_for_parity_state_in_later_frame() {
        let mut table = Table::new("coop08");
        table.step();
        table.peers[0]
            .sim
            .state_mut()
            .scores
            .award(PlayerSlot::One, 500);
        table.step();
        let bricks = table.peers[0].sim.state().bricks.clone();
        table.lobby.leave_room(table.ids[0]).unwrap();

        let index = table.seat("coop08", 99);
        // joined and the retained state arrive in separate frames
        let mut pending = table.inboxes[index].drain();
        let parity = pending.split_off(1);

        let rejoined = &mut table.peers[index];
        assert!(rejoined.frame(pending).is_empty());
        assert!(rejoined.is_authoritative());
        assert!(!rejoined.click());
        assert!(rejoined.frame(Vec::new()).is_empty());

        let outgoing = rejoined.frame(parity);
        assert!(!outgoing.is_empty());
        table.route(index, outgoing);

        let rejoined = &table.peers[index];
        assert_eq!(rejoined.sim.state().scores.player1_score, 500);
        assert_eq!(rejoined.sim.state().bricks, bricks);
        let retained = table.lobby.get_room("coop08").unwrap().snapshot().unwrap();
        assert_eq!(retained.scores.as_ref().unwrap().total_score, 500);
    }

    #[test]
    fn test_third_peer_sees_error() {
        let mut table = Table::new("coop07");
        let index = table.seat("coop07", 5);
        table.step();
        assert_eq!(table.peers[index].last_error(), Some("Room is full"));
        assert_eq!(table.peers[index].player(), None);
    }
}
