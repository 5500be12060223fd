//! Built-in pattern set used when `scan` is given no pattern file.

use hunter_core::{PatternSet, PatternSignature};

const BUILTIN: &[(&str, &str)] = &[
    (
        "PlayerName",
        "48 8B 0D ?? ?? ?? ?? 48 8D 54 24 38 C6 44 24 20 00 E8 ?? ?? ?? ?? 48 8B 5C 24 70 48 8B 7C 24 60 48 83 C4 68 C3",
    ),
    (
        "CurrentPlayerName",
        "48 8B 0D ?? ?? ?? ?? 48 8D 55 ?? 45 31 C9 41 89 C0 E8",
    ),
    (
        "PlayerDamage",
        "48 8B 0D ?? ?? ?? ?? E8 ?? ?? ?? ?? 48 8B D8 48 85 C0 75 04 33 C9",
    ),
    (
        "Monster",
        "48 8B 0D ?? ?? ?? ?? B2 01 E8 ?? ?? ?? ?? C6 83 ?? ?? ?? ?? ?? 48 8B 0D",
    ),
    (
        "PlayerBuff",
        "48 8B 05 ?? ?? ?? ?? 41 8B 94 00 ?? ?? ?? ?? 89 57",
    ),
    (
        "LobbyStatus",
        "48 8B 0D ?? ?? ?? ?? E8 ?? ?? ?? ?? 48 8B 4E ?? F3 0F 10 86 ?? ?? ?? ?? F3 0F 58 86 ?? ?? ?? ?? F3 0F 11 86 ?? ?? ?? ?? E8 ?? ?? ?? ?? 48 8B 4E",
    ),
    ("Emetta", "45 6D 65 74 74 61"),
    (
        "PlayerNameLinux",
        "48 8B 0D ?? ?? ?? ?? 48 8D 54 24 ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? 48 8B 5C 24 60 48 83 C4 50 5F C3",
    ),
];

pub fn builtin_patterns() -> PatternSet {
    PatternSet {
        patterns: BUILTIN
            .iter()
            .map(|(name, pattern)| PatternSignature::new(name, pattern))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hunter_core::pattern::compile_all;

    #[test]
    fn test_builtin_patterns_compile() {
        let set = builtin_patterns();
        assert_eq!(set.patterns.len(), BUILTIN.len());
        assert!(compile_all(&set).iter().all(|p| p.is_ok()));
    }

    #[test]
    fn test_rip_relative_patterns_start_with_opcode() {
        let set = builtin_patterns();
        let player = set.get("playername").unwrap();
        assert!(player.pattern.starts_with("48 8B 0D ?? ?? ?? ??"));
    }
}
