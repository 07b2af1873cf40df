// i18n.rs
//
// Runtime string catalogs:
// - Bundled: en and zh-Hans are compiled in and always available
// - Overrides: assets/i18n/<lang>.json or assets/i18n.json
//   ({ "<lang>": { "key": "value" } }), next to the exe or in the working dir
// - Lookup: selected lang -> en -> the key itself
// - tr("key") / tr_with("key", &[("name", ...)]) fills {name} placeholders
//
// Language selection: --lang <code>, else TOUR_PANORAMA_LANG, else en.

use once_cell::sync::{Lazy, OnceCell};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const FALLBACK_LANG: &str = "en";
pub const LANG_ENV: &str = "TOUR_PANORAMA_LANG";

const BUNDLED_EN: &str = include_str!("../assets/i18n/en.json");
const BUNDLED_ZH_HANS: &str = include_str!("../assets/i18n/zh-Hans.json");

/// (code, native name) of every bundled language.
pub const LANGUAGES: [(&str, &str); 2] = [("en", "English"), ("zh-Hans", "简体中文")];

struct Catalog {
    lang: String,
    map: HashMap<String, String>,
    fallback_map: HashMap<String, String>,
}

static CATALOG: OnceCell<RwLock<Catalog>> = OnceCell::new();

static BUNDLED_FALLBACK: Lazy<HashMap<String, String>> =
    Lazy::new(|| bundled(FALLBACK_LANG).unwrap_or_default());

fn bundled(lang: &str) -> Option<HashMap<String, String>> {
    let text = match lang {
        "en" => BUNDLED_EN,
        "zh-Hans" => BUNDLED_ZH_HANS,
        _ => return None,
    };
    match serde_json::from_str(text) {
        Ok(m) => Some(m),
        Err(e) => {
            log::error!("bundled catalog {lang} is malformed: {e}");
            None
        }
    }
}

fn read_map(path: &Path) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

fn read_multi_lang(path: &Path, lang: &str) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    let mut all: HashMap<String, HashMap<String, String>> = serde_json::from_str(&text).ok()?;
    all.remove(lang)
}

/// `<exe_dir>/assets/<rel>` first, then `./assets/<rel>`.
fn find_asset(rel: &Path) -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join(rel);
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join(rel);
    p.exists().then_some(p)
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    let mut map = bundled(lang).unwrap_or_default();

    let per_lang = Path::new("i18n").join(format!("{lang}.json"));
    let overrides = find_asset(&per_lang)
        .and_then(|p| read_map(&p))
        .or_else(|| find_asset(Path::new("i18n.json")).and_then(|p| read_multi_lang(&p, lang)));
    if let Some(o) = overrides {
        map.extend(o);
    }

    if map.is_empty() {
        log::warn!("no strings found for language {lang}");
    }
    map
}

/// (Re)initialise the global catalog. Later calls replace the language.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let map = load_lang(&lang);
    let fallback_map = if lang == FALLBACK_LANG {
        map.clone()
    } else {
        load_lang(FALLBACK_LANG)
    };
    let c = Catalog {
        lang,
        map,
        fallback_map,
    };

    if let Some(lock) = CATALOG.get() {
        if let Ok(mut w) = lock.write() {
            *w = c;
        }
    } else if let Err(rejected) = CATALOG.set(RwLock::new(c)) {
        // lost a race with another init; overwrite its choice
        if let (Some(lock), Ok(c)) = (CATALOG.get(), rejected.into_inner()) {
            if let Ok(mut w) = lock.write() {
                *w = c;
            }
        }
    }
}

pub fn current_lang() -> String {
    CATALOG
        .get()
        .and_then(|l| l.read().ok().map(|c| c.lang.clone()))
        .unwrap_or_else(|| FALLBACK_LANG.to_string())
}

/// Localised text for `key`; the key itself when nothing matches.
pub fn tr(key: &str) -> String {
    if let Some(c) = CATALOG.get().and_then(|l| l.read().ok()) {
        if let Some(v) = c.map.get(key).or_else(|| c.fallback_map.get(key)) {
            return v.clone();
        }
    }
    BUNDLED_FALLBACK
        .get(key)
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

/// `tr` plus `{name}` substitution. Unknown placeholders are left as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    let mut s = tr(key);
    for (k, v) in args {
        s = s.replace(&format!("{{{k}}}"), v);
    }
    s
}

/// `--lang <code>` from the command line, else the env var, else en.
pub fn resolve_lang(args: &[String]) -> String {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == "--lang" {
            if let Some(v) = it.next() {
                return v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var(LANG_ENV) {
        if !v.trim().is_empty() {
            return v;
        }
    }

    FALLBACK_LANG.to_string()
}
