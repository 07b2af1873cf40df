// fonts.rs — egui font setup for languages the default fonts can't draw
//
// egui's bundled fonts cover Latin text. For CJK languages we look for a
// system font (or one shipped in ./assets/fonts) and put it first in both
// families. ab_glyph parses each candidate so broken files are skipped.

use std::path::{Path, PathBuf};

pub fn needs_cjk_font(lang: &str) -> bool {
    let l = lang.to_ascii_lowercase();
    l.starts_with("zh") || l.starts_with("ja") || l.starts_with("ko")
}

fn candidates() -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();

    if cfg!(windows) {
        let dir = PathBuf::from(r"C:\Windows\Fonts");
        for f in ["msyh.ttf", "simhei.ttf", "Deng.ttf", "meiryo.ttf", "malgun.ttf"] {
            out.push(dir.join(f));
        }
    } else if cfg!(target_os = "macos") {
        for p in [
            "/System/Library/Fonts/PingFang.ttc",
            "/System/Library/Fonts/STHeiti Medium.ttc",
            "/Library/Fonts/Arial Unicode.ttf",
        ] {
            out.push(PathBuf::from(p));
        }
    } else {
        for p in [
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
            "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
        ] {
            out.push(PathBuf::from(p));
        }
    }

    let shipped = ["NotoSansSC-Regular.otf", "NotoSansSC-Regular.ttf", "NotoSansCJK-Regular.ttc"];
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            out.extend(shipped.iter().map(|f| dir.join("assets").join("fonts").join(f)));
        }
    }
    out.extend(shipped.iter().map(|f| PathBuf::from("assets").join("fonts").join(f)));
    out
}

fn load_font(path: &Path) -> Option<Vec<u8>> {
    let bytes = std::fs::read(path).ok()?;
    // .ttc support in ab_glyph is patchy; a failed parse just means "next"
    ab_glyph::FontRef::try_from_slice(&bytes).ok()?;
    Some(bytes)
}

/// Installs a CJK-capable font for `lang`, or restores egui's defaults.
pub fn setup_egui_fonts(ctx: &egui::Context, lang: &str) {
    let mut fonts = egui::FontDefinitions::default();

    if needs_cjk_font(lang) {
        match candidates().into_iter().find_map(|p| load_font(&p).map(|b| (p, b))) {
            Some((path, bytes)) => {
                log::info!(
                    "{}",
                    crate::i18n::tr_with("font.using", &[("path", path.display().to_string())])
                );
                fonts
                    .font_data
                    .insert("ui".to_owned(), egui::FontData::from_owned(bytes));
                for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                    if let Some(list) = fonts.families.get_mut(&family) {
                        list.insert(0, "ui".to_owned());
                    }
                }
            }
            None => log::warn!("{}", crate::i18n::tr("font.not_found")),
        }
    }

    ctx.set_fonts(fonts);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cjk_languages_need_a_font() {
        assert!(needs_cjk_font("zh-Hans"));
        assert!(needs_cjk_font("ja"));
        assert!(needs_cjk_font("KO"));
        assert!(!needs_cjk_font("en"));
        assert!(!needs_cjk_font("fr"));
    }

    #[test]
    fn unreadable_fonts_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.ttf");
        std::fs::write(&bogus, b"definitely not a font").unwrap();
        assert!(load_font(&bogus).is_none());
        assert!(load_font(&dir.path().join("absent.ttf")).is_none());
    }
}
