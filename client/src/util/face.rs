//! Robot face color model.
//!
//! The face glows in a color picked from the current emotion. Low confidence
//! overrides the emotion with the alert color. Color changes are eased: each
//! frame advances a transition parameter by `FRAME_STEP` and moves the current
//! color toward the target by that fraction, snapping once it reaches 1.

#[cfg(test)]
#[path = "face_test.rs"]
mod face_test;

use std::fmt;

/// Transition progress added per animation frame.
pub const FRAME_STEP: f64 = 0.02;
/// Below this confidence the face shows the alert color.
pub const LOW_CONFIDENCE: f64 = 0.6;
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const NEUTRAL: Self = Self(0, 122, 255);
    pub const ALERT: Self = Self(255, 69, 0);

    #[must_use]
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

/// Parse `#RGB` or `#RRGGBB`. Anything other than ASCII hex digits after the
/// `#` is rejected.
#[must_use]
pub fn parse_hex(raw: &str) -> Option<Rgb> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => Some(Rgb(
            channel(&hex[0..1].repeat(2))?,
            channel(&hex[1..2].repeat(2))?,
            channel(&hex[2..3].repeat(2))?,
        )),
        6 => Some(Rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

/// Palette color for an emotion name. Unknown emotions are neutral.
#[must_use]
pub fn emotion_color(emotion: &str) -> Rgb {
    match emotion {
        "learning" => Rgb(0, 255, 127),
        "frustrated" => Rgb(255, 40, 40),
        "happy" => Rgb(255, 215, 0),
        "thinking" => Rgb(147, 112, 219),
        "excited" => Rgb(255, 105, 180),
        "satisfied" => Rgb(50, 205, 50),
        "calm" => Rgb(0, 191, 255),
        "alert" => Rgb::ALERT,
        _ => Rgb::NEUTRAL,
    }
}

/// Color the face should settle on.
#[must_use]
pub fn target_color(emotion: &str, confidence: f64) -> Rgb {
    if confidence < LOW_CONFIDENCE { Rgb::ALERT } else { emotion_color(emotion) }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp(a: u8, b: u8, t: f64) -> u8 {
    let (a, b) = (f64::from(a), f64::from(b));
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

/// Grey level of the mouth bar.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn mouth_intensity(emotion: &str, confidence: f64) -> u8 {
    let base = (120.0 - (1.0 - confidence) * 100.0).round().max(20.0);
    let level = match emotion {
        "frustrated" | "alert" => base.max(60.0),
        "happy" | "satisfied" => (base + 40.0).min(255.0),
        _ => base,
    };
    level.clamp(0.0, 255.0) as u8
}

/// Ring drawn around the face while confidence is below 1.
#[must_use]
pub fn confidence_ring(confidence: f64) -> Option<&'static str> {
    if confidence >= 1.0 {
        None
    } else if confidence < LOW_CONFIDENCE {
        Some("#ff4444")
    } else {
        Some("#44ff44")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FaceAnimator {
    current: Rgb,
    target: Rgb,
    progress: f64,
}

impl Default for FaceAnimator {
    fn default() -> Self {
        Self { current: Rgb::NEUTRAL, target: Rgb::NEUTRAL, progress: 0.0 }
    }
}

impl FaceAnimator {
    #[must_use]
    pub fn current(&self) -> Rgb {
        self.current
    }

    #[must_use]
    pub fn target(&self) -> Rgb {
        self.target
    }

    /// Retarget for a new emotion/confidence pair. Restarts the transition
    /// only when the target color actually changes.
    pub fn set_mood(&mut self, emotion: &str, confidence: f64) -> bool {
        let next = target_color(emotion, confidence);
        if next == self.target {
            return false;
        }
        self.target = next;
        self.progress = 0.0;
        true
    }

    /// Advance one frame and return the color to draw.
    pub fn step(&mut self) -> Rgb {
        if self.progress < 1.0 {
            let t = (self.progress + FRAME_STEP).min(1.0);
            self.current = Rgb(
                lerp(self.current.0, self.target.0, t),
                lerp(self.current.1, self.target.1, t),
                lerp(self.current.2, self.target.2, t),
            );
            self.progress = t;
            if t >= 1.0 {
                self.current = self.target;
                self.progress = 0.0;
            }
        }
        self.current
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }
}
