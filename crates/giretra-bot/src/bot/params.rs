/// Tunable weights for the heuristic bidder and player.
///
/// Strength figures are on a 0..=100 scale; see `BidPlanner::hand_strength`.
#[derive(Debug, Clone, Copy)]
pub struct BotParams {
    // === Hand strength ===
    /// Percent of the hand's card points that count toward strength (default: 40)
    pub strength_point_share: i32,

    /// Bonus per top-ranked card (trump J/9, plain A/10) (default: 5)
    pub strength_top_card: i32,

    /// Bonus per second-tier card (default: 3)
    pub strength_second_card: i32,

    /// Bonus per trump held in a Colour mode (default: 4)
    pub strength_per_trump: i32,

    /// Bonus for holding the trump Jack (default: 8)
    pub strength_trump_jack: i32,

    /// Bonus for holding the trump Nine (default: 5)
    pub strength_trump_nine: i32,

    /// AllTrumps bonus per Jack (default: 6)
    pub strength_all_trumps_jack: i32,

    /// AllTrumps bonus per Nine (default: 4)
    pub strength_all_trumps_nine: i32,

    /// NoTrumps bonus per Ace (default: 5)
    pub strength_no_trumps_ace: i32,

    /// NoTrumps bonus per Ten (default: 2)
    pub strength_no_trumps_ten: i32,

    // === Bidding thresholds ===
    /// Strength at which the best mode is announced outright (default: 60)
    pub announce_strong: i32,

    /// Strength at which any mode may be announced (default: 45)
    pub announce_decent: i32,

    /// Minimum strength to accept a bid that doubles on acceptance (default: 40)
    pub accept_auto_double: i32,

    /// Strength good enough to outbid rather than accept an auto-double (default: 35)
    pub escape_auto_double: i32,

    /// Master cards needed before doubling or redoubling (default: 3)
    pub double_masters: usize,
}

impl Default for BotParams {
    fn default() -> Self {
        Self {
            strength_point_share: 40,
            strength_top_card: 5,
            strength_second_card: 3,
            strength_per_trump: 4,
            strength_trump_jack: 8,
            strength_trump_nine: 5,
            strength_all_trumps_jack: 6,
            strength_all_trumps_nine: 4,
            strength_no_trumps_ace: 5,
            strength_no_trumps_ten: 2,
            announce_strong: 60,
            announce_decent: 45,
            accept_auto_double: 40,
            escape_auto_double: 35,
            double_masters: 3,
        }
    }
}
