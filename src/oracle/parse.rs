use super::OracleError;
use crate::types::*;
use serde::Deserialize;

/// Fields the oracle is asked to fill in
#[derive(Debug, Deserialize)]
struct RoundPayload {
    #[serde(default)]
    theme: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    items: Vec<String>,
    #[serde(default)]
    difficulty: Option<serde_json::Value>,
}

/// Slice out the first balanced `{...}` object, skipping braces inside strings.
///
/// Models like to wrap JSON in markdown fences or chat around it.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_difficulty(value: Option<serde_json::Value>) -> Difficulty {
    value
        .and_then(|v| serde_json::from_value::<Difficulty>(v).ok())
        .unwrap_or_default()
}

/// Turn a model reply into a round for `mode`.
///
/// Free-text rounds always carry zero items; every other mode needs exactly
/// four non-empty ones.
pub fn parse_round_payload(text: &str, mode: GameMode) -> Result<RoundData, OracleError> {
    let json = extract_json_object(text)
        .ok_or_else(|| OracleError::InvalidReply("no JSON object in reply".to_string()))?;
    let payload: RoundPayload =
        serde_json::from_str(json).map_err(|e| OracleError::InvalidReply(e.to_string()))?;

    let theme = payload.theme.trim().to_string();
    if theme.is_empty() {
        return Err(OracleError::InvalidReply("missing theme".to_string()));
    }

    let items: Vec<String> = if mode.is_free_text() {
        Vec::new()
    } else {
        let items: Vec<String> = payload
            .items
            .iter()
            .map(|item| item.trim().to_string())
            .collect();
        if items.len() != 4 || items.iter().any(|item| item.is_empty()) {
            return Err(OracleError::InvalidReply(format!(
                "expected 4 items for {}, got {:?}",
                mode.label(),
                items
            )));
        }
        items
    };

    Ok(RoundData {
        mode,
        item_ids: items.iter().map(|_| ulid::Ulid::new().to_string()).collect(),
        items,
        theme,
        description: payload.description.trim().to_string(),
        difficulty: parse_difficulty(payload.difficulty),
        luck_outcomes: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_fenced_reply() {
        let reply = "Sure! ```json\n{\"theme\": \"Caves\", \"items\": []}\n``` enjoy";
        assert_eq!(
            extract_json_object(reply),
            Some("{\"theme\": \"Caves\", \"items\": []}")
        );
    }

    #[test]
    fn test_extract_ignores_braces_in_strings() {
        let reply = r#"{"theme": "a } b", "description": "say \"{\""} trailing }"#;
        assert_eq!(
            extract_json_object(reply),
            Some(r#"{"theme": "a } b", "description": "say \"{\""}"#)
        );
    }

    #[test]
    fn test_extract_takes_first_object() {
        let reply = r#"{"a": {"b": 1}} {"c": 2}"#;
        assert_eq!(extract_json_object(reply), Some(r#"{"a": {"b": 1}}"#));
    }

    #[test]
    fn test_extract_unbalanced() {
        assert_eq!(extract_json_object("{\"theme\": \"x\""), None);
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn test_parse_standard_round() {
        let reply = r#"{"theme": "Nether dangers", "description": "Pick the safest",
            "items": ["Ghast", " Blaze ", "Strider", "Piglin"], "difficulty": "hard"}"#;
        let round = parse_round_payload(reply, GameMode::MysteryMob).unwrap();
        assert_eq!(round.mode, GameMode::MysteryMob);
        assert_eq!(round.items[1], "Blaze");
        assert_eq!(round.item_ids.len(), 4);
        assert_eq!(round.difficulty, Difficulty::Hard);
        assert!(round.luck_outcomes.is_none());
    }

    #[test]
    fn test_free_text_round_drops_items() {
        let reply = r#"{"theme": "Something that burns", "description": "Type it",
            "items": ["Log", "Coal"], "difficulty": "médio"}"#;
        let round = parse_round_payload(reply, GameMode::LuckyTheme).unwrap();
        assert!(round.items.is_empty());
        assert!(round.item_ids.is_empty());
        assert_eq!(round.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_wrong_item_count_rejected() {
        let reply = r#"{"theme": "Ores", "items": ["Iron", "Gold", "Coal"]}"#;
        assert!(matches!(
            parse_round_payload(reply, GameMode::CursedVein),
            Err(OracleError::InvalidReply(_))
        ));

        let reply = r#"{"theme": "Ores", "items": ["Iron", "Gold", "Coal", "  "]}"#;
        assert!(parse_round_payload(reply, GameMode::CursedVein).is_err());
    }

    #[test]
    fn test_unknown_difficulty_defaults_to_medium() {
        let reply = r#"{"theme": "Ores", "items": ["Iron", "Gold", "Coal", "Lapis"],
            "difficulty": "nightmare"}"#;
        let round = parse_round_payload(reply, GameMode::CursedVein).unwrap();
        assert_eq!(round.difficulty, Difficulty::Medium);
    }
}
