//! AI configuration: difficulty tiers, weights, randomization and blunders.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, MoveHistory, MoveRecord, Player, Result, SwapRule};

/// Difficulty tiers, weakest first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Learning,
    Easy,
    #[default]
    Standard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] =
        [Difficulty::Learning, Difficulty::Easy, Difficulty::Standard, Difficulty::Expert];

    pub const fn as_str(self) -> &'static str {
        match self {
            Difficulty::Learning => "learning",
            Difficulty::Easy => "easy",
            Difficulty::Standard => "standard",
            Difficulty::Expert => "expert",
        }
    }

    /// The only kind of deliberate mistake this tier may make.
    pub const fn allowed_blunder(self) -> BlunderKind {
        match self {
            Difficulty::Learning | Difficulty::Easy => BlunderKind::AllowImmediateWin,
            Difficulty::Standard => BlunderKind::AllowForcingMove,
            Difficulty::Expert => BlunderKind::None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Difficulty> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownName { kind: "difficulty", name: s.to_string() })
    }
}

/// Which disqualified moves a blunder may pick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlunderKind {
    #[default]
    None,
    /// Moves that let the opponent win on the next ply.
    AllowImmediateWin,
    /// Moves that let the opponent play a forcing move.
    AllowForcingMove,
}

/// Evaluator feature weights.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Weights {
    pub connection: i16,
    pub bridge: i16,
    pub swap_pressure: i16,
    pub blocking: i16,
    pub mobility: i16,
}

impl Weights {
    /// Tuned weights for each swap rule.
    pub const fn for_rule(rule: SwapRule) -> Weights {
        let [connection, bridge, swap_pressure, blocking, mobility] = match rule {
            SwapRule::Classic => [58, 78, 40, 41, 35],
            SwapRule::ClearsOwn => [73, 52, 69, 22, 11],
            SwapRule::SwappedClears => [69, 37, 62, 47, 8],
            SwapRule::SwappedClearsOwn => [63, 39, 67, 36, 20],
        };
        Weights { connection, bridge, swap_pressure, blocking, mobility }
    }
}

/// Everything the search needs to know besides the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiConfig {
    pub swap_rule: SwapRule,
    pub difficulty: Difficulty,
    /// Side the AI plays; overwritten per search unless `hint_profile` is set.
    pub player: Player,
    pub weights: Weights,
    pub forcing_check: bool,
    /// Deterministic suggestions for a human player.
    pub hint_profile: bool,
    /// Attach an evaluation breakdown to each decision.
    pub diagnostics: bool,
    pub random_top_k: u8,
    pub random_epsilon_pct: u8,
    pub blunder_enabled: bool,
    pub blunder_kind: BlunderKind,
    pub blunder_chance_pct: u8,
    #[serde(default)]
    pub last_opponent_move: Option<MoveRecord>,
    #[serde(default)]
    pub own_previous_move: Option<MoveRecord>,
}

impl AiConfig {
    /// Config for one tier, rule and side.
    pub fn new(swap_rule: SwapRule, difficulty: Difficulty, player: Player) -> AiConfig {
        let mut config = AiConfig {
            swap_rule,
            difficulty,
            player,
            weights: Weights::for_rule(swap_rule),
            forcing_check: difficulty >= Difficulty::Standard,
            hint_profile: false,
            diagnostics: false,
            random_top_k: 1,
            random_epsilon_pct: 0,
            blunder_enabled: false,
            blunder_kind: difficulty.allowed_blunder(),
            blunder_chance_pct: 0,
            last_opponent_move: None,
            own_previous_move: None,
        };

        let (top_k, epsilon, blunder_pct) = match difficulty {
            Difficulty::Learning => (3, 20, 20),
            Difficulty::Easy => (3, 10, 15),
            Difficulty::Standard => (2, 5, 10),
            Difficulty::Expert => (1, 0, 0),
        };
        config.set_randomization(top_k, epsilon);
        config.blunder_chance_pct = blunder_pct;
        config.blunder_enabled = blunder_pct > 0;
        config
    }

    /// Deterministic Expert-strength suggestions for `player`.
    pub fn hint(swap_rule: SwapRule, player: Player) -> AiConfig {
        let mut config = AiConfig::new(swap_rule, Difficulty::Expert, player);
        config.hint_profile = true;
        config
    }

    /// Turn any config into its hint variant, keeping rule and weights.
    pub fn as_hint(&self, player: Player) -> AiConfig {
        AiConfig {
            player,
            hint_profile: true,
            blunder_enabled: false,
            random_top_k: 1,
            random_epsilon_pct: 0,
            ..self.clone()
        }
    }

    /// Switch rule, refreshing the rule's weights.
    pub fn set_swap_rule(&mut self, rule: SwapRule) {
        self.swap_rule = rule;
        self.weights = Weights::for_rule(rule);
    }

    /// Top-K tiers (0 is treated as 1) and epsilon (capped at 100%).
    pub fn set_randomization(&mut self, top_k: u8, epsilon_pct: u8) {
        self.random_top_k = top_k.max(1);
        self.random_epsilon_pct = epsilon_pct.min(100);
    }

    /// Configure blunders. The kind is always forced to the tier's allowed kind.
    pub fn set_blunder(&mut self, enabled: bool, chance_pct: u8) {
        let allowed = self.difficulty.allowed_blunder();
        if allowed == BlunderKind::None {
            self.blunder_kind = BlunderKind::None;
            self.blunder_enabled = false;
            self.blunder_chance_pct = 0;
            return;
        }
        self.blunder_kind = allowed;
        self.blunder_chance_pct = chance_pct.min(100);
        self.blunder_enabled = enabled && self.blunder_chance_pct > 0;
    }

    /// Fill the anti-oscillation records from recent history.
    ///
    /// Entry 0 is the opponent's last move, entry 1 our own move before it.
    pub fn with_history(mut self, history: &MoveHistory) -> AiConfig {
        self.last_opponent_move = history.get(0).map(|m| m.record());
        self.own_previous_move = history.get(1).map(|m| m.record());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Move, Pos};

    #[test]
    fn test_difficulty_table() {
        let learning = AiConfig::new(SwapRule::Classic, Difficulty::Learning, Player::White);
        assert!(!learning.forcing_check);
        assert_eq!((learning.random_top_k, learning.random_epsilon_pct), (3, 20));
        assert_eq!(learning.blunder_chance_pct, 20);
        assert!(learning.blunder_enabled);
        assert_eq!(learning.blunder_kind, BlunderKind::AllowImmediateWin);

        let easy = AiConfig::new(SwapRule::Classic, Difficulty::Easy, Player::White);
        assert!(!easy.forcing_check);
        assert_eq!((easy.random_top_k, easy.random_epsilon_pct, easy.blunder_chance_pct), (3, 10, 15));

        let standard = AiConfig::new(SwapRule::Classic, Difficulty::Standard, Player::Black);
        assert!(standard.forcing_check);
        assert_eq!((standard.random_top_k, standard.random_epsilon_pct, standard.blunder_chance_pct), (2, 5, 10));
        assert_eq!(standard.blunder_kind, BlunderKind::AllowForcingMove);

        let expert = AiConfig::new(SwapRule::Classic, Difficulty::Expert, Player::Black);
        assert!(expert.forcing_check);
        assert!(!expert.blunder_enabled);
        assert_eq!(expert.blunder_kind, BlunderKind::None);
        assert_eq!((expert.random_top_k, expert.random_epsilon_pct), (1, 0));
    }

    #[test]
    fn test_weights_follow_rule() {
        let config = AiConfig::new(SwapRule::SwappedClears, Difficulty::Easy, Player::White);
        assert_eq!(config.weights, Weights { connection: 69, bridge: 37, swap_pressure: 62, blocking: 47, mobility: 8 });
        let mut config = config;
        config.set_swap_rule(SwapRule::ClearsOwn);
        assert_eq!(config.weights.connection, 73);
        assert_eq!(config.weights.mobility, 11);
    }

    #[test]
    fn test_set_randomization_clamps() {
        let mut config = AiConfig::new(SwapRule::Classic, Difficulty::Easy, Player::White);
        config.set_randomization(0, 250);
        assert_eq!(config.random_top_k, 1);
        assert_eq!(config.random_epsilon_pct, 100);
    }

    #[test]
    fn test_set_blunder_respects_tier() {
        let mut expert = AiConfig::new(SwapRule::Classic, Difficulty::Expert, Player::White);
        expert.set_blunder(true, 50);
        assert!(!expert.blunder_enabled);
        assert_eq!(expert.blunder_chance_pct, 0);

        let mut easy = AiConfig::new(SwapRule::Classic, Difficulty::Easy, Player::White);
        easy.blunder_kind = BlunderKind::AllowForcingMove;
        easy.set_blunder(true, 180);
        assert_eq!(easy.blunder_kind, BlunderKind::AllowImmediateWin);
        assert_eq!(easy.blunder_chance_pct, 100);
        assert!(easy.blunder_enabled);

        easy.set_blunder(true, 0);
        assert!(!easy.blunder_enabled);
    }

    #[test]
    fn test_hint_profile() {
        let hint = AiConfig::new(SwapRule::Classic, Difficulty::Learning, Player::Black).as_hint(Player::White);
        assert!(hint.hint_profile);
        assert!(!hint.blunder_enabled);
        assert_eq!(hint.random_top_k, 1);
        assert_eq!(hint.player, Player::White);
        assert!(AiConfig::hint(SwapRule::ClearsOwn, Player::Black).hint_profile);
    }

    #[test]
    fn test_with_history() {
        let mut history = MoveHistory::new();
        let own = Move::step(Player::White, Pos::from_row_col(6, 0), Pos::from_row_col(5, 0));
        let theirs = Move::step(Player::Black, Pos::from_row_col(1, 0), Pos::from_row_col(2, 0));
        history.push(own);
        history.push(theirs);
        let config = AiConfig::new(SwapRule::Classic, Difficulty::Expert, Player::White).with_history(&history);
        assert_eq!(config.last_opponent_move, Some(theirs.record()));
        assert_eq!(config.own_previous_move, Some(own.record()));
    }

    #[test]
    fn test_difficulty_parse_and_order() {
        assert_eq!("Expert".parse::<Difficulty>().ok(), Some(Difficulty::Expert));
        assert!("grandmaster".parse::<Difficulty>().is_err());
        assert!(Difficulty::Standard > Difficulty::Easy);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = AiConfig::new(SwapRule::SwappedClearsOwn, Difficulty::Standard, Player::Black);
        let json = serde_json::to_string(&config).unwrap();
        let back: AiConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
