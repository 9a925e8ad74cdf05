//! Luck block effects and the per-player outcome draw.

use crate::types::*;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashMap;

/// Chance of a luck block round before one has happened this session
pub const LUCK_CHANCE_FRESH: f64 = 0.12;
/// Chance once a luck block round has already happened
pub const LUCK_CHANCE_REPEAT: f64 = 0.05;

pub struct LuckEntry {
    pub name: &'static str,
    pub kind: EffectKind,
    pub description: &'static str,
}

pub const LUCK_TABLE: [LuckEntry; 10] = [
    LuckEntry {
        name: "Enchanted Golden Apple",
        kind: EffectKind::Beneficial,
        description: "The next time this player would lose a life, the damage is ignored",
    },
    LuckEntry {
        name: "Potion of Weakness",
        kind: EffectKind::Detrimental,
        description: "Next round this player loses two lives on a wrong answer",
    },
    LuckEntry {
        name: "Totem of the Void",
        kind: EffectKind::Beneficial,
        description: "If this player dies next round they come back with 5 lives",
    },
    LuckEntry {
        name: "Lingering Bad Luck",
        kind: EffectKind::Detrimental,
        description: "This player loses a life at the start of the next round",
    },
    LuckEntry {
        name: "Oracle's Blessing",
        kind: EffectKind::Beneficial,
        description: "This player may be wrong once without penalty",
    },
    LuckEntry {
        name: "Temporary Immunity",
        kind: EffectKind::Beneficial,
        description: "This player is immune to all damage next round",
    },
    LuckEntry {
        name: "Domino Effect",
        kind: EffectKind::Chaotic,
        description: "If this player loses a life next round, another random player loses one too",
    },
    LuckEntry {
        name: "Ghost Shield",
        kind: EffectKind::Beneficial,
        description: "This player's first mistake in the next two rounds is ignored",
    },
    LuckEntry {
        name: "Extra Heart",
        kind: EffectKind::Beneficial,
        description: "Gain an extra life",
    },
    LuckEntry {
        name: "Reflected Damage",
        kind: EffectKind::Chaotic,
        description: "If this player loses a life next round, the Oracle picks another player to lose one too",
    },
];

impl LuckEntry {
    pub fn to_effect(&self) -> PlayerEffect {
        PlayerEffect {
            id: ulid::Ulid::new().to_string(),
            name: self.name.to_string(),
            kind: self.kind,
            description: self.description.to_string(),
        }
    }
}

pub fn luck_chance(luck_block_appeared: bool) -> f64 {
    if luck_block_appeared {
        LUCK_CHANCE_REPEAT
    } else {
        LUCK_CHANCE_FRESH
    }
}

/// Draw one effect for every living non-host player
pub fn draw_outcomes<R: Rng + ?Sized>(
    players: &[Player],
    rng: &mut R,
) -> HashMap<PlayerId, PlayerEffect> {
    players
        .iter()
        .filter(|p| !p.is_host && p.is_alive())
        .filter_map(|p| {
            LUCK_TABLE
                .choose(&mut *rng)
                .map(|entry| (p.id.clone(), entry.to_effect()))
        })
        .collect()
}

pub fn luck_round<R: Rng + ?Sized>(players: &[Player], rng: &mut R) -> RoundData {
    RoundData {
        mode: GameMode::LuckBlock,
        items: Vec::new(),
        item_ids: Vec::new(),
        theme: "EVENT: LUCK BLOCK!".to_string(),
        description: "Everyone gets a random effect. Break the block to find out your fate!"
            .to_string(),
        difficulty: Difficulty::Medium,
        luck_outcomes: Some(draw_outcomes(players, rng)),
    }
}
