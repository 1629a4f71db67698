use crate::keys::{KeyChord, KeyCode, Modifier, NamedKey};
use anyhow::{Context, anyhow};
use deskpilot_engine::traits::Automation;
use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use image::ImageFormat;
use std::io::Cursor;
use xcap::Monitor;

/// Drives the real pointer and keyboard through enigo and captures the
/// primary monitor through xcap.
///
/// Every call opens its own enigo connection on a blocking thread; the OS
/// handles are not shared across tasks.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopAutomation;

impl DesktopAutomation {
    pub fn new() -> Self {
        Self
    }
}

fn open_enigo() -> anyhow::Result<Enigo> {
    Enigo::new(&Settings::default()).map_err(|e| anyhow!("failed to init enigo: {e}"))
}

async fn with_enigo<F>(op: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut Enigo) -> anyhow::Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut enigo = open_enigo()?;
        op(&mut enigo)
    })
    .await
    .context("input task panicked")?
}

fn abs(x: u32, y: u32) -> anyhow::Result<(i32, i32)> {
    let x = i32::try_from(x).context("x coordinate out of range")?;
    let y = i32::try_from(y).context("y coordinate out of range")?;
    Ok((x, y))
}

fn enigo_key(code: KeyCode) -> anyhow::Result<Key> {
    let key = match code {
        KeyCode::Char(c) => Key::Unicode(c),
        KeyCode::Modifier(m) => modifier_key(m),
        KeyCode::Named(named) => match named {
            NamedKey::Enter => Key::Return,
            NamedKey::Tab => Key::Tab,
            NamedKey::Escape => Key::Escape,
            NamedKey::Backspace => Key::Backspace,
            NamedKey::Delete => Key::Delete,
            NamedKey::Space => Key::Space,
            NamedKey::Up => Key::UpArrow,
            NamedKey::Down => Key::DownArrow,
            NamedKey::Left => Key::LeftArrow,
            NamedKey::Right => Key::RightArrow,
            NamedKey::Home => Key::Home,
            NamedKey::End => Key::End,
            NamedKey::PageUp => Key::PageUp,
            NamedKey::PageDown => Key::PageDown,
            NamedKey::CapsLock => Key::CapsLock,
            NamedKey::F(n @ 1..=20) => function_key(n),
            other => native_key(other)?,
        },
    };
    Ok(key)
}

fn modifier_key(m: Modifier) -> Key {
    match m {
        Modifier::Ctrl => Key::Control,
        Modifier::Alt => Key::Alt,
        Modifier::Shift => Key::Shift,
        Modifier::Meta => Key::Meta,
    }
}

fn function_key(n: u8) -> Key {
    match n {
        1 => Key::F1,
        2 => Key::F2,
        3 => Key::F3,
        4 => Key::F4,
        5 => Key::F5,
        6 => Key::F6,
        7 => Key::F7,
        8 => Key::F8,
        9 => Key::F9,
        10 => Key::F10,
        11 => Key::F11,
        12 => Key::F12,
        13 => Key::F13,
        14 => Key::F14,
        15 => Key::F15,
        16 => Key::F16,
        17 => Key::F17,
        18 => Key::F18,
        19 => Key::F19,
        _ => Key::F20,
    }
}

// Keys without a portable enigo variant, sent as the platform's raw code:
// virtual-key codes on Windows, keysyms on X11/Wayland.
#[cfg(target_os = "windows")]
fn native_key(key: NamedKey) -> anyhow::Result<Key> {
    let vk = match key {
        NamedKey::Insert => 0x2d,
        NamedKey::PrintScreen => 0x2c,
        NamedKey::Menu => 0x5d,
        NamedKey::F(n @ 21..=24) => 0x84 + u32::from(n - 21),
        other => return Err(anyhow!("no key code for {other:?}")),
    };
    Ok(Key::Other(vk))
}

#[cfg(all(unix, not(target_os = "macos")))]
fn native_key(key: NamedKey) -> anyhow::Result<Key> {
    let keysym = match key {
        NamedKey::Insert => 0xff63,
        NamedKey::PrintScreen => 0xff61,
        NamedKey::Menu => 0xff67,
        NamedKey::F(n @ 21..=24) => 0xffbe + u32::from(n - 1),
        other => return Err(anyhow!("no key code for {other:?}")),
    };
    Ok(Key::Other(keysym))
}

#[cfg(not(any(target_os = "windows", all(unix, not(target_os = "macos")))))]
fn native_key(key: NamedKey) -> anyhow::Result<Key> {
    Err(anyhow!("{key:?} is not available on this platform"))
}

fn press_chord(enigo: &mut Enigo, chord: &KeyChord) -> anyhow::Result<()> {
    let key = enigo_key(chord.key)?;
    for m in &chord.modifiers {
        enigo
            .key(modifier_key(*m), Direction::Press)
            .map_err(|e| anyhow!("key press failed: {e:?}"))?;
    }

    let clicked = enigo
        .key(key, Direction::Click)
        .map_err(|e| anyhow!("key press failed: {e:?}"));

    // Release modifiers even when the main key failed.
    for m in chord.modifiers.iter().rev() {
        let _ = enigo.key(modifier_key(*m), Direction::Release);
    }
    clicked
}

fn capture_primary() -> anyhow::Result<Vec<u8>> {
    let monitors = Monitor::all().map_err(|e| anyhow!("failed to list monitors: {e}"))?;
    let monitor = monitors.first().ok_or_else(|| anyhow!("no monitors found"))?;

    let image = monitor
        .capture_image()
        .map_err(|e| anyhow!("screen capture failed: {e}"))?;

    let mut bytes: Vec<u8> = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| anyhow!("failed to encode screenshot: {e}"))?;
    Ok(bytes)
}

#[async_trait::async_trait]
impl Automation for DesktopAutomation {
    async fn move_to(&self, x: u32, y: u32) -> anyhow::Result<()> {
        let (x, y) = abs(x, y)?;
        with_enigo(move |enigo| {
            enigo
                .move_mouse(x, y, Coordinate::Abs)
                .map_err(|e| anyhow!("mouse move failed: {e:?}"))
        })
        .await
    }

    async fn click(&self) -> anyhow::Result<()> {
        with_enigo(|enigo| {
            enigo
                .button(Button::Left, Direction::Click)
                .map_err(|e| anyhow!("click failed: {e:?}"))
        })
        .await
    }

    async fn drag_to(&self, x: u32, y: u32) -> anyhow::Result<()> {
        let (x, y) = abs(x, y)?;
        with_enigo(move |enigo| {
            enigo
                .button(Button::Left, Direction::Press)
                .map_err(|e| anyhow!("drag press failed: {e:?}"))?;
            let moved = enigo
                .move_mouse(x, y, Coordinate::Abs)
                .map_err(|e| anyhow!("drag move failed: {e:?}"));
            let released = enigo
                .button(Button::Left, Direction::Release)
                .map_err(|e| anyhow!("drag release failed: {e:?}"));
            moved.and(released)
        })
        .await
    }

    async fn write(&self, text: &str) -> anyhow::Result<()> {
        let text = text.to_string();
        with_enigo(move |enigo| {
            enigo
                .text(&text)
                .map_err(|e| anyhow!("typing failed: {e:?}"))
        })
        .await
    }

    async fn press(&self, key: &str) -> anyhow::Result<()> {
        let chord: KeyChord = key.parse()?;
        log::debug!("pressing {chord}");
        with_enigo(move |enigo| press_chord(enigo, &chord)).await
    }

    async fn capture_screenshot(&self) -> anyhow::Result<Vec<u8>> {
        let png = tokio::task::spawn_blocking(capture_primary)
            .await
            .context("capture task panicked")??;
        log::debug!("captured screenshot ({} bytes)", png.len());
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> anyhow::Result<Key> {
        enigo_key(name.parse::<KeyChord>()?.key)
    }

    #[test]
    fn maps_portable_keys() {
        assert_eq!(key("Return").unwrap(), Key::Return);
        assert_eq!(key("Caps_Lock").unwrap(), Key::CapsLock);
        assert_eq!(key("F13").unwrap(), Key::F13);
        assert_eq!(key("KP_Add").unwrap(), Key::Unicode('+'));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn maps_x11_only_keys_to_keysyms() {
        assert_eq!(key("Insert").unwrap(), Key::Other(0xff63));
        assert_eq!(key("Print").unwrap(), Key::Other(0xff61));
        assert_eq!(key("Menu").unwrap(), Key::Other(0xff67));
        assert_eq!(key("F21").unwrap(), Key::Other(0xffd2));
    }
}
