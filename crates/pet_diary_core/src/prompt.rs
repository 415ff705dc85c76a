//! crates/pet_diary_core/src/prompt.rs
//!
//! Builds the natural-language instruction sent to the diary LLM.
//!
//! The templates are pure data: swapping the wording never touches the
//! orchestration logic. `build_prompt` is deterministic and does no I/O.

/// The pronoun used when the owner did not pick one.
pub const DEFAULT_FIRST_PERSON: &str = "ぼく";

const PERSONA_NAMED: &str = r#"あなたは「{pet_name}」という名前のペットです。
飼い主が見せてくれた今日の写真をもとに、{pet_name}自身になりきって今日の日記を書いてください。
一人称は必ず「{pronoun}」を使ってください。
"#;

const PERSONA_UNNAMED: &str = r#"あなたは写真に写っているペットです。
飼い主が見せてくれた今日の写真をもとに、ペット自身になりきって今日の日記を書いてください。
一人称は必ず「{pronoun}」を使ってください。
"#;

const CHARACTERISTICS_SECTION: &str = r#"
# 性格・特徴
{characteristics}
日記の内容はこの性格・特徴と矛盾しないようにしてください。
"#;

const MEMO_SECTION: &str = r#"
# 今日の出来事
{memo}
日記の中でこの出来事に触れてください。
"#;

const WRITING_RULES: &str = r#"
# 書き方のルール
- 日記は200〜300文字程度を目安にしてください。
- 一人称は「{pronoun}」だけを使い、それ以外の一人称は絶対に使わないでください。
- 犬なら「ワン」、猫なら「にゃん」、うさぎや小鳥ならそれらしい仕草など、動物らしい言い回しを自然に混ぜて構いません。
- 飼い主への親しみが伝わる、あたたかく素直な文章にしてください。
"#;

/// Assembles the persona instruction for one generation request.
///
/// Blank `characteristics` / `owner_memo` omit their sections entirely;
/// a blank or absent `pronoun` falls back to [`DEFAULT_FIRST_PERSON`].
pub fn build_prompt(
    pet_name: &str,
    characteristics: Option<&str>,
    owner_memo: Option<&str>,
    pronoun: Option<&str>,
) -> String {
    let pronoun = match pronoun.map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => DEFAULT_FIRST_PERSON,
    };
    let pet_name = pet_name.trim();

    let mut prompt = if pet_name.is_empty() {
        PERSONA_UNNAMED.replace("{pronoun}", pronoun)
    } else {
        PERSONA_NAMED
            .replace("{pet_name}", pet_name)
            .replace("{pronoun}", pronoun)
    };

    if let Some(traits) = characteristics.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str(&CHARACTERISTICS_SECTION.replace("{characteristics}", traits));
    }

    if let Some(memo) = owner_memo.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str(&MEMO_SECTION.replace("{memo}", memo));
    }

    prompt.push_str(&WRITING_RULES.replace("{pronoun}", pronoun));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_default_pronoun_when_absent() {
        let prompt = build_prompt("ポチ", None, None, None);
        assert!(prompt.contains(DEFAULT_FIRST_PERSON));
        assert!(prompt.contains("ポチ"));
    }

    #[test]
    fn supplied_pronoun_replaces_the_default_everywhere() {
        let prompt = build_prompt("Pochi", Some(""), Some(""), Some("わたし"));
        assert!(prompt.contains("わたし"));
        assert!(!prompt.contains(DEFAULT_FIRST_PERSON));
    }

    #[test]
    fn pronoun_constraint_is_repeated() {
        let prompt = build_prompt("タマ", None, None, Some("オレ"));
        assert!(prompt.matches("オレ").count() >= 2);
    }

    #[test]
    fn blank_optional_sections_are_omitted() {
        let prompt = build_prompt("ポチ", Some("   "), Some(""), None);
        assert!(!prompt.contains("性格・特徴"));
        assert!(!prompt.contains("今日の出来事"));
    }

    #[test]
    fn characteristics_become_a_personality_section() {
        let prompt = build_prompt("ポチ", Some("こわがりだけど甘えんぼ"), None, None);
        assert!(prompt.contains("性格・特徴"));
        assert!(prompt.contains("こわがりだけど甘えんぼ"));
    }

    #[test]
    fn memo_becomes_a_todays_events_section() {
        let prompt = build_prompt("ポチ", None, Some("公園で初めてボール遊びをした"), None);
        assert!(prompt.contains("今日の出来事"));
        assert!(prompt.contains("公園で初めてボール遊びをした"));
    }

    #[test]
    fn blank_pet_name_falls_back_to_generic_persona() {
        let prompt = build_prompt("  ", None, None, None);
        assert!(prompt.contains("写真に写っているペット"));
        assert!(!prompt.contains("「」"));
    }

    #[test]
    fn same_inputs_yield_the_same_prompt() {
        let a = build_prompt("ポチ", Some("元気"), Some("散歩"), Some("ぼく"));
        let b = build_prompt("ポチ", Some("元気"), Some("散歩"), Some("ぼく"));
        assert_eq!(a, b);
    }
}
