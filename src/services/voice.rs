use serde::{Deserialize, Serialize};

/// Requested voice flavour for narration. `Auto` defers to the
/// platform default for the story's language.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoicePreference {
    #[default]
    Auto,
    Male,
    Female,
    Boy,
    Girl,
}

/// One entry of the runtime's voice catalog. Read-only to us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDescriptor {
    pub name: String,
    /// BCP 47 tag as reported by the engine, e.g. "en-US".
    pub language_tag: String,
}

// Scoring weights. Heuristic, not sacred: tune freely.
const QUALITY_BONUS: i32 = 20;
const PREFERENCE_BONUS: i32 = 10;
const PLATFORM_PENALTY: i32 = -2;

const QUALITY_MARKERS: [&str; 3] = ["neural", "premium", "enhanced"];
const PLATFORM_MARKERS: [&str; 3] = ["desktop", "microsoft", "google"];

/// Pick the best catalog voice for a language and preference.
///
/// Selection algorithm:
///   1. `Auto` or an empty catalog → no selection (caller uses the
///      platform default).
///   2. Keep voices whose primary language subtag matches.
///   3. Score each candidate by display-name markers, highest wins;
///      ties keep the earliest catalog entry.
///
/// Pure and infallible: a language match always yields a voice,
/// preference aside.
pub fn pick_voice(
    available: &[VoiceDescriptor],
    language_tag: &str,
    preference: VoicePreference,
) -> Option<VoiceDescriptor> {
    if preference == VoicePreference::Auto || available.is_empty() {
        return None;
    }

    let wanted = primary_subtag(language_tag).to_ascii_lowercase();
    let mut best: Option<(&VoiceDescriptor, i32)> = None;

    for voice in available {
        if primary_subtag(&voice.language_tag).to_ascii_lowercase() != wanted {
            continue;
        }
        let score = score_name(&voice.name.to_lowercase(), preference);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((voice, score)),
        }
    }

    best.map(|(voice, _)| voice.clone())
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

fn score_name(name: &str, preference: VoicePreference) -> i32 {
    let mut score = 0;

    if QUALITY_MARKERS.iter().any(|m| name.contains(m)) {
        score += QUALITY_BONUS;
    }

    // "female" contains "male", so the female check must win.
    let female = name.contains("female");
    let male = !female && name.contains("male");

    match preference {
        VoicePreference::Male => {
            if male {
                score += PREFERENCE_BONUS;
            } else if female {
                score -= PREFERENCE_BONUS;
            }
        }
        VoicePreference::Female => {
            if female {
                score += PREFERENCE_BONUS;
            } else if male {
                score -= PREFERENCE_BONUS;
            }
        }
        VoicePreference::Boy | VoicePreference::Girl => {
            if name.contains("child") || name.contains("kid") {
                score += PREFERENCE_BONUS;
            }
            if preference == VoicePreference::Girl && male {
                score -= PREFERENCE_BONUS;
            }
            if preference == VoicePreference::Boy && female {
                score -= PREFERENCE_BONUS;
            }
        }
        VoicePreference::Auto => {}
    }

    if PLATFORM_MARKERS.iter().any(|m| name.contains(m)) {
        score += PLATFORM_PENALTY;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, tag: &str) -> VoiceDescriptor {
        VoiceDescriptor {
            name: name.to_string(),
            language_tag: tag.to_string(),
        }
    }

    #[test]
    fn auto_preference_never_selects() {
        let catalog = vec![voice("Premium Neural Female", "en-US")];
        assert_eq!(pick_voice(&catalog, "en-US", VoicePreference::Auto), None);
    }

    #[test]
    fn empty_catalog_yields_no_selection() {
        assert_eq!(pick_voice(&[], "en-US", VoicePreference::Female), None);
        assert_eq!(pick_voice(&[], "en-US", VoicePreference::Boy), None);
    }

    #[test]
    fn no_language_match_yields_no_selection() {
        let catalog = vec![voice("Anna", "de-DE")];
        assert_eq!(pick_voice(&catalog, "en-US", VoicePreference::Female), None);
    }

    #[test]
    fn prefers_quality_and_matching_gender() {
        // Worked example: "Premium Neural Female" scores 20 + 10 = 30,
        // "Google US English Male" scores -2 - 10 = -12.
        let catalog = vec![
            voice("Google US English Male", "en-US"),
            voice("Premium Neural Female", "en-GB"),
        ];
        let picked = pick_voice(&catalog, "en-US", VoicePreference::Female);
        assert_eq!(picked.map(|v| v.name), Some("Premium Neural Female".to_string()));
    }

    #[test]
    fn female_name_does_not_count_as_male() {
        // Substring trap: with preference Male, a "Female" voice must
        // land at -10, not at +10 - 10.
        assert_eq!(score_name("female narrator", VoicePreference::Male), -10);
        assert_eq!(score_name("male narrator", VoicePreference::Male), 10);
    }

    #[test]
    fn child_preferences_reward_child_voices() {
        let catalog = vec![
            voice("Samantha Female", "en-US"),
            voice("Kids Voice One", "en-US"),
        ];
        let picked = pick_voice(&catalog, "en-US", VoicePreference::Girl);
        assert_eq!(picked.map(|v| v.name), Some("Kids Voice One".to_string()));

        assert_eq!(score_name("child male", VoicePreference::Girl), 0);
        assert_eq!(score_name("child female", VoicePreference::Girl), 10);
        assert_eq!(score_name("child female", VoicePreference::Boy), 0);
    }

    #[test]
    fn floor_tie_returns_first_language_match() {
        let catalog = vec![
            voice("Plain One", "en-US"),
            voice("Plain Two", "en-GB"),
        ];
        let picked = pick_voice(&catalog, "en", VoicePreference::Male);
        assert_eq!(picked.map(|v| v.name), Some("Plain One".to_string()));
    }

    #[test]
    fn primary_subtag_match_is_case_insensitive() {
        let catalog = vec![voice("Reader", "EN_us")];
        assert!(pick_voice(&catalog, "en-GB", VoicePreference::Male).is_some());
    }

    #[test]
    fn selection_is_deterministic() {
        let catalog = vec![
            voice("Google US English Male", "en-US"),
            voice("Premium Neural Female", "en-GB"),
        ];
        let first = pick_voice(&catalog, "en-US", VoicePreference::Female);
        let second = pick_voice(&catalog, "en-US", VoicePreference::Female);
        assert_eq!(first, second);
    }
}
