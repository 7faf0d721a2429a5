const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Nearest equal-tempered note for `freq_hz` (A4 = 440 Hz), or `"--"` when
/// there is no usable pitch.
pub fn note_name(freq_hz: f32) -> String {
    if !freq_hz.is_finite() || freq_hz < 20.0 {
        return "--".into();
    }
    let midi = (69.0 + 12.0 * (freq_hz / 440.0).log2()).round() as i32;
    let name = NOTE_NAMES[midi.rem_euclid(12) as usize];
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", name, octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(440.0), "A4");
        assert_eq!(note_name(430.7), "A4");
        assert_eq!(note_name(261.63), "C4");
        assert_eq!(note_name(27.5), "A0");
        assert_eq!(note_name(4186.0), "C8");
    }

    #[test]
    fn test_no_pitch() {
        assert_eq!(note_name(0.0), "--");
        assert_eq!(note_name(12.0), "--");
        assert_eq!(note_name(f32::NAN), "--");
    }
}
