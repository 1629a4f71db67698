use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Meta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Space,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    PrintScreen,
    CapsLock,
    Menu,
    /// F1 through F24.
    F(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Named(NamedKey),
    Modifier(Modifier),
    Char(char),
}

/// A key press with held modifiers, e.g. `ctrl+shift+t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    pub modifiers: Vec<Modifier>,
    pub key: KeyCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("empty key name")]
    Empty,
    #[error("unknown key {0:?}")]
    Unknown(String),
}

impl FromStr for KeyChord {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(KeyParseError::Empty);
        }
        // A trailing "+" after a separator is the plus key itself: "+", "ctrl++".
        let (held, last) = if s == "+" {
            ("", "+")
        } else if let Some(head) = s.strip_suffix("++") {
            (head, "+")
        } else {
            match s.rsplit_once('+') {
                Some((head, key)) => (head, key.trim()),
                None => ("", s),
            }
        };

        let mut modifiers = Vec::new();
        if !held.trim().is_empty() {
            for part in held.split('+').map(str::trim) {
                match parse_modifier(part) {
                    Some(m) if !modifiers.contains(&m) => modifiers.push(m),
                    Some(_) => {}
                    None => return Err(KeyParseError::Unknown(part.to_string())),
                }
            }
        }

        Ok(KeyChord {
            modifiers,
            key: parse_key(last)?,
        })
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            write!(f, "{m:?}+")?;
        }
        match self.key {
            KeyCode::Named(k) => write!(f, "{k:?}"),
            KeyCode::Modifier(m) => write!(f, "{m:?}"),
            KeyCode::Char(c) => write!(f, "{c}"),
        }
    }
}

fn canonical(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_modifier(name: &str) -> Option<Modifier> {
    match canonical(name).as_str() {
        "ctrl" | "control" | "controll" | "controlr" => Some(Modifier::Ctrl),
        "alt" | "altl" | "altr" | "option" => Some(Modifier::Alt),
        "shift" | "shiftl" | "shiftr" => Some(Modifier::Shift),
        "meta" | "super" | "superl" | "superr" | "cmd" | "command" | "win" | "windows" => {
            Some(Modifier::Meta)
        }
        _ => None,
    }
}

fn parse_key(name: &str) -> Result<KeyCode, KeyParseError> {
    if name.is_empty() {
        return Err(KeyParseError::Empty);
    }

    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }

    let canon = canonical(name);
    if let Some(c) = punctuation(&canon) {
        return Ok(KeyCode::Char(c));
    }

    let key = match canon.as_str() {
        "enter" | "return" | "kpenter" => NamedKey::Enter,
        "tab" => NamedKey::Tab,
        "esc" | "escape" => NamedKey::Escape,
        "backspace" => NamedKey::Backspace,
        "delete" | "del" => NamedKey::Delete,
        "space" => NamedKey::Space,
        "up" | "uparrow" => NamedKey::Up,
        "down" | "downarrow" => NamedKey::Down,
        "left" | "leftarrow" => NamedKey::Left,
        "right" | "rightarrow" => NamedKey::Right,
        "home" => NamedKey::Home,
        "end" => NamedKey::End,
        "pageup" | "prior" => NamedKey::PageUp,
        "pagedown" | "next" => NamedKey::PageDown,
        "insert" | "ins" | "kpinsert" => NamedKey::Insert,
        "print" | "printscreen" | "prtsc" | "prtscr" | "snapshot" => NamedKey::PrintScreen,
        "capslock" | "caps" => NamedKey::CapsLock,
        "menu" | "apps" | "contextmenu" => NamedKey::Menu,
        "kpup" => NamedKey::Up,
        "kpdown" => NamedKey::Down,
        "kpleft" => NamedKey::Left,
        "kpright" => NamedKey::Right,
        "kphome" => NamedKey::Home,
        "kpend" => NamedKey::End,
        "kpdelete" => NamedKey::Delete,
        other => {
            if let Some(m) = parse_modifier(other) {
                return Ok(KeyCode::Modifier(m));
            }
            match other.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                Some(n @ 1..=24) => NamedKey::F(n),
                _ => return Err(KeyParseError::Unknown(name.to_string())),
            }
        }
    };
    Ok(KeyCode::Named(key))
}

// X keysym and xdotool spellings of printable keys, after `canonical`.
fn punctuation(canon: &str) -> Option<char> {
    let c = match canon {
        "plus" | "kpadd" => '+',
        "minus" | "kpsubtract" => '-',
        "equal" | "equals" | "kpequal" => '=',
        "asterisk" | "kpmultiply" => '*',
        "slash" | "kpdivide" => '/',
        "period" | "kpdecimal" => '.',
        "comma" | "kpseparator" => ',',
        "backslash" => '\\',
        "semicolon" => ';',
        "colon" => ':',
        "apostrophe" | "quote" => '\'',
        "grave" | "backtick" => '`',
        "bracketleft" => '[',
        "bracketright" => ']',
        "parenleft" => '(',
        "parenright" => ')',
        "underscore" => '_',
        "kpspace" => ' ',
        _ => {
            let digit = canon.strip_prefix("kp")?;
            let mut chars = digit.chars();
            return match (chars.next(), chars.next()) {
                (Some(d), None) if d.is_ascii_digit() => Some(d),
                _ => None,
            };
        }
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(s: &str) -> KeyChord {
        s.parse().unwrap()
    }

    #[test]
    fn parses_named_keys_case_insensitively() {
        assert_eq!(chord("enter").key, KeyCode::Named(NamedKey::Enter));
        assert_eq!(chord("Return").key, KeyCode::Named(NamedKey::Enter));
        assert_eq!(chord("Page_Down").key, KeyCode::Named(NamedKey::PageDown));
        assert_eq!(chord("BackSpace").key, KeyCode::Named(NamedKey::Backspace));
        assert_eq!(chord("F5").key, KeyCode::Named(NamedKey::F(5)));
    }

    #[test]
    fn parses_modifier_chords() {
        let c = chord("ctrl+shift+t");
        assert_eq!(c.modifiers, vec![Modifier::Ctrl, Modifier::Shift]);
        assert_eq!(c.key, KeyCode::Char('t'));
        assert_eq!(c.to_string(), "Ctrl+Shift+t");

        let c = chord("super+L");
        assert_eq!(c.modifiers, vec![Modifier::Meta]);
        assert_eq!(c.key, KeyCode::Char('L'));
    }

    #[test]
    fn lone_modifier_and_plus_are_keys() {
        assert_eq!(chord("shift").key, KeyCode::Modifier(Modifier::Shift));
        assert_eq!(chord("+").key, KeyCode::Char('+'));
    }

    #[test]
    fn accepts_xdotool_key_names() {
        let table: &[(&str, KeyCode)] = &[
            ("Insert", KeyCode::Named(NamedKey::Insert)),
            ("Print", KeyCode::Named(NamedKey::PrintScreen)),
            ("Caps_Lock", KeyCode::Named(NamedKey::CapsLock)),
            ("Menu", KeyCode::Named(NamedKey::Menu)),
            ("F13", KeyCode::Named(NamedKey::F(13))),
            ("F24", KeyCode::Named(NamedKey::F(24))),
            ("KP_Enter", KeyCode::Named(NamedKey::Enter)),
            ("KP_Home", KeyCode::Named(NamedKey::Home)),
            ("plus", KeyCode::Char('+')),
            ("minus", KeyCode::Char('-')),
            ("equal", KeyCode::Char('=')),
            ("KP_Add", KeyCode::Char('+')),
            ("KP_Subtract", KeyCode::Char('-')),
            ("KP_Multiply", KeyCode::Char('*')),
            ("KP_7", KeyCode::Char('7')),
            ("comma", KeyCode::Char(',')),
            ("period", KeyCode::Char('.')),
            ("slash", KeyCode::Char('/')),
            ("backslash", KeyCode::Char('\\')),
            ("bracketleft", KeyCode::Char('[')),
        ];
        for (name, expected) in table {
            assert_eq!(
                name.parse::<KeyChord>().map(|c| c.key),
                Ok(*expected),
                "{name}"
            );
        }
    }

    #[test]
    fn plus_key_inside_chords() {
        for name in ["ctrl+plus", "ctrl++", "Control_L + KP_Add"] {
            let c = chord(name);
            assert_eq!(c.modifiers, vec![Modifier::Ctrl], "{name}");
            assert_eq!(c.key, KeyCode::Char('+'), "{name}");
        }
        let c = chord("ctrl+shift+minus");
        assert_eq!(c.modifiers, vec![Modifier::Ctrl, Modifier::Shift]);
        assert_eq!(c.key, KeyCode::Char('-'));
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(
            "hyper+x".parse::<KeyChord>(),
            Err(KeyParseError::Unknown("hyper".into()))
        );
        assert!("F99".parse::<KeyChord>().is_err());
        assert!("F25".parse::<KeyChord>().is_err());
        assert!("KP_Foo".parse::<KeyChord>().is_err());
        assert!("ctrl+".parse::<KeyChord>().is_err());
        assert_eq!("  ".parse::<KeyChord>(), Err(KeyParseError::Empty));
    }
}
