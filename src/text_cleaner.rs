//! Deterministic 17-stage prose-cleaning pipeline.
//!
//! Each stage is a pure function over the string state, run in a fixed
//! order so the whole pipeline stays idempotent and easy to reason about
//! one stage at a time.

use once_cell::sync::Lazy;
use regex::Regex;

/// Runs the full pipeline. Empty input yields empty output; the pipeline is
/// idempotent (`clean(clean(x)) == clean(x)`).
pub fn clean(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let mut text = input.to_string();
    text = strip_html(&text);
    text = normalize_table_glyphs(&text);
    text = remove_compound_ui_tokens(&text);
    text = remove_engagement_boilerplate(&text);
    text = remove_comment_widgets(&text);
    text = remove_translator_credits(&text);
    text = remove_navigation_tokens(&text);
    text = remove_urls_emails_handles(&text);
    text = remove_timestamps(&text);
    text = remove_separator_runs(&text);
    text = context_aware_ui_word_removal(&text);
    text = trim_trailing_ui_repeats(&text);
    text = line_whitelist_filter(&text);
    text = substitute_emoji_and_symbols(&text);
    text = remap_brackets(&text);
    text = normalize_punctuation(&text);
    text = final_whitespace_pass(&text);
    text
}

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&nbsp;|&amp;|&lt;|&gt;|&quot;|&#\d+;").unwrap());

fn strip_html(text: &str) -> String {
    let text = RE_TAG.replace_all(text, "");
    RE_ENTITY.replace_all(&text, " ").into_owned()
}

static RE_PIPE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|{2,}").unwrap());
static RE_PIPE_SPACED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|(?=\s*\w)").unwrap());
static RE_TABLE_BORDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+-+\+").unwrap());
static RE_DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{3,}").unwrap());

fn normalize_table_glyphs(text: &str) -> String {
    let text = RE_PIPE_RUN.replace_all(text, " | ");
    let text = RE_PIPE_SPACED.replace_all(&text, " | ");
    let text = RE_TABLE_BORDER.replace_all(&text, "");
    RE_DASH_RUN.replace_all(&text, " ").into_owned()
}

static RE_CONCAT_UI: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)LatestMost").unwrap(),
        Regex::new(r"(?i)MostOldest").unwrap(),
        Regex::new(r"(?i)LatestOldest").unwrap(),
        Regex::new(r"(?i)LikedOldest").unwrap(),
        Regex::new(r"(?i)[a-z](Latest|Most|Oldest)").unwrap(),
    ]
});

fn remove_compound_ui_tokens(text: &str) -> String {
    let mut text = text.to_string();
    for re in RE_CONCAT_UI.iter() {
        text = re.replace_all(&text, "").into_owned();
    }
    text
}

static RE_SOCIAL_UI: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?is)Like\s+this\s+chapter\?.*?Rate\s+it\s+\d+\s+stars?!?").unwrap(),
        Regex::new(r"(?is)Rate\s+this\s+chapter.*?\d+\s+stars?").unwrap(),
        Regex::new(r"(?is)Follow\s+.*?\s+on\s+(Twitter|Facebook|Instagram)").unwrap(),
        Regex::new(r"(?is)Contact\s*:\s*\w+@\w+\.\w+").unwrap(),
    ]
});

fn remove_engagement_boilerplate(text: &str) -> String {
    let mut text = text.to_string();
    for re in RE_SOCIAL_UI.iter() {
        text = re.replace_all(&text, "").into_owned();
    }
    text
}

static RE_UI_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?is)What\s+do\s+you\s+think\?.*?Total\s+Responses.*?Sort\s+by.*?").unwrap(),
        Regex::new(
            r"(?is)Total\s+Responses:?\s*\d+.*?Sort\s+by:?.*?(Latest|Most|Oldest|Liked).*?Add\s+a\s+(Comment|Post).*?",
        )
        .unwrap(),
        Regex::new(r"(?is)Add\s+a\s+Post.*?Loading.*?Load\s+More.*?").unwrap(),
        Regex::new(r"(?is)Reply\s+to.*?Submit\s+Reply.*?").unwrap(),
        Regex::new(r"(?i)\[?Thank\s+You\s+For\s+Your\s+Support!?\]?").unwrap(),
    ]
});

fn remove_comment_widgets(text: &str) -> String {
    let mut text = text.to_string();
    for re in RE_UI_BLOCKS.iter() {
        text = re.replace_all(&text, "").into_owned();
    }
    text
}

static RE_TRANSLATOR: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?im)Translator\s*:?\s*[A-Za-z_]+\s*_?\s*Editor\s*:?\s*[A-Za-z_]+").unwrap(),
        Regex::new(r"(?im)^Translator\s*:?\s*[A-Za-z_]+\s*Editor\s*:?\s*[A-Za-z_]+\s*In\s*$")
            .unwrap(),
        Regex::new(r"(?im)^Translator\s*:?\s*[A-Za-z_]+\s*_?\s*Editor\s*:?\s*[A-Za-z_]+\s*In\s*$")
            .unwrap(),
        Regex::new(r"(?im)Translator\s*:?\s*\w+").unwrap(),
        Regex::new(r"(?im)Editor\s*:?\s*\w+").unwrap(),
        Regex::new(r"(?im)Translation\s*:?\s*\w+").unwrap(),
        Regex::new(r"(?im)Translated\s+by\s*:?\s*\w+").unwrap(),
        Regex::new(r"(?im)Edited\s+by\s*:?\s*\w+").unwrap(),
        Regex::new(r"(?im)By\s+[A-Za-z\s]+(?:\|.*)?").unwrap(),
    ]
});

fn remove_translator_credits(text: &str) -> String {
    let mut text = text.to_string();
    for re in RE_TRANSLATOR.iter() {
        text = re.replace_all(&text, "").into_owned();
    }
    text
}

static RE_NAV: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bNext\s+Chapter\b").unwrap(),
        Regex::new(r"(?i)\bPrevious\s+Chapter\b").unwrap(),
        Regex::new(r"(?i)\bTable\s+of\s+Contents\b").unwrap(),
        Regex::new(r"(?i)\bTOC\b").unwrap(),
        Regex::new(r"(?i)\bAdvertisement\b").unwrap(),
        Regex::new(r"(?i)\bAd\s+\d+\b").unwrap(),
        Regex::new(r"(?i)\bClick\s+here\b").unwrap(),
        Regex::new(r"(?i)\bRead\s+more\b").unwrap(),
        Regex::new(r"(?i)\bPage\s+\d+\b").unwrap(),
        Regex::new(r"\d+\s*/\s*\d+").unwrap(),
        Regex::new(r"(?i)\bNovelBin\b|\bNovelFull\b|\bWebNovel\b|\bWuxiaWorld\b").unwrap(),
        Regex::new(r"(?i)\bRead\s+online\b|\bRead\s+free\b").unwrap(),
        Regex::new(r"(?i)\bUpdated\s+on\b|\bLast\s+updated\b").unwrap(),
        Regex::new(r"(?i)\bPlease\s+enable\s+JavaScript\b").unwrap(),
        Regex::new(r"(?i)\bEnable\s+JavaScript\b").unwrap(),
    ]
});

fn remove_navigation_tokens(text: &str) -> String {
    let mut text = text.to_string();
    for re in RE_NAV.iter() {
        text = re.replace_all(&text, "").into_owned();
    }
    text
}

static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static RE_WWW: Lazy<Regex> = Lazy::new(|| Regex::new(r"www\.\S+").unwrap());
static RE_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+").unwrap());
static RE_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").unwrap());
static RE_HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").unwrap());

fn remove_urls_emails_handles(text: &str) -> String {
    let text = RE_URL.replace_all(text, "");
    let text = RE_WWW.replace_all(&text, "");
    let text = RE_EMAIL.replace_all(&text, "");
    let text = RE_MENTION.replace_all(&text, "");
    RE_HASHTAG.replace_all(&text, "").into_owned()
}

static RE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}").unwrap());
static RE_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}:\d{2}(?::\d{2})?(?:\s*[AP]M)?").unwrap());

fn remove_timestamps(text: &str) -> String {
    let text = RE_DATE.replace_all(text, "");
    RE_TIME.replace_all(&text, "").into_owned()
}

static RE_EQ_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[=]{2,}").unwrap());
static RE_DASH_RUN2: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-]{3,}").unwrap());
static RE_UNDERSCORE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_]{3,}").unwrap());
static RE_STAR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*]{3,}").unwrap());
static RE_TILDE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[~]{2,}").unwrap());

fn remove_separator_runs(text: &str) -> String {
    let text = RE_EQ_RUN.replace_all(text, "");
    let text = RE_DASH_RUN2.replace_all(&text, "");
    let text = RE_UNDERSCORE_RUN.replace_all(&text, "");
    let text = RE_STAR_RUN.replace_all(&text, "");
    let text = RE_TILDE_RUN.replace_all(&text, "");
    text.replace('\u{00D7}', "")
}

static RE_SORT_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(Sort\s+by:?\s*)(Latest|Most|Oldest)\b").unwrap());
static RE_LIKED_FOLLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Liked(\s*Oldest|\s*Add|\s*Post|\s*Comment|\s*Sort)").unwrap());
static RE_LATEST_FOLLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Latest|Most|Oldest)(\s*Add\s+a\s+Post|\s*Post\s+Comment|\s*Loading|\s*Load\s+More)").unwrap()
});

fn context_aware_ui_word_removal(text: &str) -> String {
    let text = RE_SORT_BY.replace_all(text, "$1");
    let text = RE_LIKED_FOLLOWED.replace_all(&text, "$1");
    RE_LATEST_FOLLOWED.replace_all(&text, "$2").into_owned()
}

static RE_LIKED_OLDEST_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)(LikedOldest\s*)+$").unwrap());
static RE_LATEST_REPEAT_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)((Latest|Most|Oldest)\s*){3,}$").unwrap());

fn trim_trailing_ui_repeats(text: &str) -> String {
    let text = RE_LIKED_OLDEST_TAIL.replace_all(text, "");
    RE_LATEST_REPEAT_TAIL.replace_all(&text, "").into_owned()
}

static RE_UI_INDICATORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)Thank\s+You\s+For\s+Your\s+Support").unwrap(),
        Regex::new(r"(?i)What\s+do\s+you\s+think").unwrap(),
        Regex::new(r"(?i)Total\s+Responses").unwrap(),
        Regex::new(r"(?i)Sort\s+by").unwrap(),
        Regex::new(r"(?i)Add\s+a\s+(Post|Comment)").unwrap(),
        Regex::new(r"(?i)Post\s+Comment").unwrap(),
        Regex::new(r"(?i)Loading").unwrap(),
        Regex::new(r"(?i)Load\s+More").unwrap(),
        Regex::new(r"(?i)Reply\s+to").unwrap(),
        Regex::new(r"(?i)Submit\s+Reply").unwrap(),
        Regex::new(r"(?i)^Chapter\s+\d+$").unwrap(),
        Regex::new(r"(?i)^Next\s+Chapter$").unwrap(),
        Regex::new(r"(?i)^Previous\s+Chapter$").unwrap(),
    ]
});
static RE_HAS_TERMINATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]").unwrap());

fn line_whitelist_filter(text: &str) -> String {
    let mut cleaned_lines: Vec<String> = Vec::new();
    for raw_line in text.split('\n') {
        let line = raw_line.trim();
        if line.is_empty() {
            if cleaned_lines.last().is_some_and(|l| !l.is_empty()) {
                cleaned_lines.push(String::new());
            }
            continue;
        }

        let is_ui_line = RE_UI_INDICATORS.iter().any(|re| re.is_match(line));
        if !is_ui_line && (line.chars().count() >= 15 || RE_HAS_TERMINATOR.is_match(line)) {
            cleaned_lines.push(line.to_string());
        }
    }
    cleaned_lines.join("\n")
}

/// `(from, to)` pairs applied as literal substring replacements, preserving
/// the Python dict's effective iteration order for the entries that matter
/// (longer tokens like `LikedOldest`'s constituents never collide here since
/// stage 3/10/11/12 already consumed them).
const EMOJI_TABLE: &[(&str, &str)] = &[
    ("\u{1F5FF}", " (stone face) "),
    ("\u{2192}", " to "),
    ("\u{2190}", " from "),
    ("\u{2191}", " up "),
    ("\u{2193}", " down "),
    ("\u{21D2}", " then "),
    ("\u{21D0}", " from "),
    ("\u{21D4}", " or "),
    ("\u{2605}", " star "),
    ("\u{2606}", " star "),
    ("\u{2726}", " star "),
    ("\u{2727}", " star "),
    ("\u{2665}", " heart "),
    ("\u{2661}", " heart "),
    ("\u{2666}", " diamond "),
    ("\u{2663}", " club "),
    ("\u{2660}", " spade "),
    ("\u{266A}", " note "),
    ("\u{266B}", " notes "),
    ("\u{266C}", " notes "),
    ("\u{00A9}", " copyright "),
    ("\u{00AE}", " registered "),
    ("\u{2122}", " trademark "),
    ("\u{2026}", "..."),
    ("\u{2014}", " - "),
    ("\u{2013}", " - "),
    ("\u{201C}", "\""),
    ("\u{201D}", "\""),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
];

/// Bare-face emoji that carry no textual stand-in; dropped outright.
const DROPPED_EMOJI: &[char] = &[
    '\u{1F600}', '\u{1F603}', '\u{1F604}', '\u{1F601}', '\u{1F606}', '\u{1F605}', '\u{1F923}',
    '\u{1F602}', '\u{1F642}', '\u{1F643}', '\u{1F609}', '\u{1F60A}', '\u{1F607}', '\u{1F970}',
    '\u{1F60D}', '\u{1F929}', '\u{1F618}', '\u{1F617}', '\u{1F61A}', '\u{1F619}', '\u{1F60B}',
    '\u{1F61B}', '\u{1F61C}', '\u{1F92A}', '\u{1F61D}', '\u{1F911}', '\u{1F917}', '\u{1F92D}',
    '\u{1F92B}', '\u{1F914}', '\u{1F910}', '\u{1F928}', '\u{1F610}', '\u{1F611}', '\u{1F636}',
    '\u{1F60F}', '\u{1F612}', '\u{1F644}', '\u{1F62C}', '\u{1F925}', '\u{1F60C}', '\u{1F614}',
    '\u{1F62A}', '\u{1F924}', '\u{1F634}', '\u{1F637}', '\u{1F912}', '\u{1F915}', '\u{1F922}',
    '\u{1F92E}', '\u{1F927}', '\u{1F975}', '\u{1F976}', '\u{1F635}', '\u{1F92F}', '\u{1F920}',
    '\u{1F973}', '\u{1F60E}', '\u{1F913}', '\u{1F9D0}', '\u{1F615}', '\u{1F61F}', '\u{1F641}',
    '\u{1F62E}', '\u{1F62F}', '\u{1F632}', '\u{1F633}', '\u{1F97A}', '\u{1F626}', '\u{1F627}',
    '\u{1F628}', '\u{1F630}', '\u{1F625}', '\u{1F622}', '\u{1F62D}', '\u{1F631}', '\u{1F616}',
    '\u{1F623}', '\u{1F61E}', '\u{1F613}', '\u{1F629}', '\u{1F62B}', '\u{1F971}', '\u{1F624}',
    '\u{1F621}', '\u{1F620}', '\u{1F92C}', '\u{1F608}', '\u{1F47F}', '\u{1F480}', '\u{1F4A9}',
    '\u{1F921}', '\u{1F479}', '\u{1F47A}', '\u{1F47B}', '\u{1F47D}', '\u{1F47E}', '\u{1F916}',
    '\u{1F63A}', '\u{1F638}', '\u{1F639}', '\u{1F63B}', '\u{1F63C}', '\u{1F63D}', '\u{1F640}',
    '\u{1F63F}', '\u{1F63E}',
];

fn substitute_emoji_and_symbols(text: &str) -> String {
    let mut text = text.to_string();
    for (from, to) in EMOJI_TABLE {
        text = text.replace(from, to);
    }
    for ch in DROPPED_EMOJI {
        text = text.replace(*ch, "");
    }

    text.chars()
        .map(|c| if is_tts_safe(c) { c } else { ' ' })
        .collect()
}

const TTS_SAFE_PUNCTUATION: &str = " .,!?;:()[]{}\"'/-_=+*&%$#@~`|\\";

/// Unicode categories this crate treats as carrying voiceable punctuation or
/// symbol content, mirroring `is_tts_safe`'s `unicodedata.category` set.
/// Built on `regex`'s Unicode property classes (already a dependency for
/// every other stage) rather than pulling in a dedicated category crate.
static RE_VOICEABLE_CATEGORY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{Po}\p{Pd}\p{Pe}\p{Pf}\p{Pi}\p{Ps}\p{Sc}\p{Sk}\p{Sm}\p{So}]$").unwrap()
});
static RE_OTHER_SYMBOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{So}$").unwrap());

fn is_tts_safe(c: char) -> bool {
    if c.is_alphanumeric() {
        return true;
    }
    if TTS_SAFE_PUNCTUATION.contains(c) {
        return true;
    }
    let mut buf = [0u8; 4];
    let s = c.encode_utf8(&mut buf);
    if RE_VOICEABLE_CATEGORY.is_match(s) {
        // Pictographic "other symbol" codepoints (emoji range) are excluded
        // even though they share the `So` category with things like `©`.
        if RE_OTHER_SYMBOL.is_match(s) && (c as u32) > 0x1F000 {
            return false;
        }
        return true;
    }
    false
}

fn remap_brackets(text: &str) -> String {
    text.replace('[', "(").replace(']', ")")
}

static RE_DOT_SPACE_DOT_SPACE_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s+\.\s+\.").unwrap());
static RE_DOT_SPACE_DOTDOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s+\.\.").unwrap());
static RE_DOTDOT_SPACE_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\.\s+\.").unwrap());
static RE_DOT_SPACE_DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s+\.{2,}").unwrap());
static RE_DOTS_SPACE_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}\s+\.").unwrap());
static RE_FOUR_DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{4,}").unwrap());
static RE_BANG_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"!{3,}").unwrap());
static RE_QUESTION_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?{3,}").unwrap());
static RE_COMMA_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r",{2,}").unwrap());
static RE_SEMI_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r";{2,}").unwrap());
static RE_COLON_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r":{2,}").unwrap());
static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([,.!?;:])").unwrap());
static RE_MISSING_SPACE_AFTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([,.!?;:])([^\s,.!?;:"'`])"#).unwrap());
static RE_ELLIPSIS_MISSING_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\.{3}([^\s,.!?;:"'`])"#).unwrap());

fn normalize_punctuation(text: &str) -> String {
    let text = RE_DOT_SPACE_DOT_SPACE_DOT.replace_all(text, "...");
    let text = RE_DOT_SPACE_DOTDOT.replace_all(&text, "...");
    let text = RE_DOTDOT_SPACE_DOT.replace_all(&text, "...");
    let text = RE_DOT_SPACE_DOTS.replace_all(&text, "...");
    let text = RE_DOTS_SPACE_DOT.replace_all(&text, "...");
    let text = RE_FOUR_DOTS.replace_all(&text, ".");
    let text = RE_BANG_RUN.replace_all(&text, "!");
    let text = RE_QUESTION_RUN.replace_all(&text, "??");
    let text = RE_COMMA_RUN.replace_all(&text, ",");
    let text = RE_SEMI_RUN.replace_all(&text, ";");
    let text = RE_COLON_RUN.replace_all(&text, ":");
    let text = RE_SPACE_BEFORE_PUNCT.replace_all(&text, "$1");
    let text = RE_MISSING_SPACE_AFTER.replace_all(&text, "$1 $2");
    RE_ELLIPSIS_MISSING_SPACE
        .replace_all(&text, "... $1")
        .into_owned()
}

static RE_MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static RE_MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n+").unwrap());
static RE_LINE_EDGE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s+|\s+$").unwrap());
static RE_EMPTY_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s*\)").unwrap());
static RE_EMPTY_BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\s*\]").unwrap());
static RE_EMPTY_BRACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\s*\}").unwrap());
static RE_DOUBLE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"  +").unwrap());

fn final_whitespace_pass(text: &str) -> String {
    let text = RE_MULTI_SPACE.replace_all(text, " ");
    let text = RE_MULTI_NEWLINE.replace_all(&text, "\n\n");
    let text = RE_LINE_EDGE_WS.replace_all(&text, "");
    let text = RE_EMPTY_PARENS.replace_all(&text, "");
    let text = RE_EMPTY_BRACKETS.replace_all(&text, "");
    let text = RE_EMPTY_BRACES.replace_all(&text, "");
    let text = RE_DOUBLE_SPACE.replace_all(&text, " ");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(clean(""), "");
    }

    #[test]
    fn idempotent() {
        let input = "<p>The sun rose.</p><p>Next Chapter</p>";
        let once = clean(input);
        let twice = clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn stable_under_trailing_whitespace() {
        let a = clean("Hello there.");
        let b = clean("Hello there.   \n\n   ");
        assert_eq!(a, b);
    }

    #[test]
    fn strips_navigation_and_translator_credit_lines() {
        let input = r#"<div class="cha-words"><p>The sun rose.</p><p>Next Chapter</p><p>Translator: Alice Editor: Bob</p><p>🗿 He stood.</p></div>"#;
        let out = clean(input);
        assert_eq!(out, "The sun rose. (stone face) He stood.");
    }

    #[test]
    fn paragraphs_joined_before_cleaning_keep_their_blank_line() {
        let joined = "The sun rose.\n\n🗿 He stood.";
        let out = clean(joined);
        assert_eq!(out, "The sun rose.\n\n (stone face) He stood.");
    }

    #[test]
    fn strips_html_tags_and_entities() {
        assert_eq!(clean("<p>Hello &amp; welcome</p>"), "Hello welcome");
    }

    #[test]
    fn drops_translator_credit_lines() {
        let out = clean("Translator: Jane Editor: Doe\nThe story begins here properly.");
        assert!(!out.to_lowercase().contains("translator"));
        assert!(out.contains("The story begins here properly."));
    }

    #[test]
    fn drops_urls_and_emails() {
        let out = clean("Visit https://example.com or mail me@example.com for more info here.");
        assert!(!out.contains("http"));
        assert!(!out.contains('@'));
    }

    #[test]
    fn collapses_excess_dots() {
        assert_eq!(clean("Wait......"), "Wait.");
    }

    #[test]
    fn collapses_triple_bang_and_question() {
        assert_eq!(clean("Stop!!! Really???"), "Stop! Really??");
    }

    #[test]
    fn brackets_remapped_to_parens() {
        assert_eq!(clean("He said [quietly] to her."), "He said (quietly) to her.");
    }

    #[test]
    fn removes_short_ui_only_lines() {
        let out = clean("Chapter 12\nThis is an actual sentence of real prose content.");
        assert!(!out.contains("Chapter 12"));
    }
}
