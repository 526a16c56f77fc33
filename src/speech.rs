//! Host speech backend
//!
//! Chimes are generated sine tones played through rodio on a short-lived
//! thread. Speech uses the `tts` crate where it is available and shells out
//! to `espeak` on Linux.

use std::time::Duration;

use queue_display_core::audio::{AudioError, SpeechSink, Tone, Utterance};
use rodio::Source;

pub struct HostSpeech {
    #[cfg(not(target_os = "linux"))]
    tts: Option<tts::Tts>,
}

impl HostSpeech {
    pub fn new() -> Self {
        #[cfg(not(target_os = "linux"))]
        let tts = match tts::Tts::default() {
            Ok(engine) => Some(engine),
            Err(e) => {
                tracing::warn!(error = %e, "Text-to-speech unavailable");
                None
            }
        };

        Self {
            #[cfg(not(target_os = "linux"))]
            tts,
        }
    }
}

impl Default for HostSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSink for HostSpeech {
    fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError> {
        let tone = tone.clone();
        std::thread::spawn(move || {
            if let Err(e) = play_sine(&tone) {
                tracing::warn!(error = %e, "Chime playback failed");
            }
        });
        Ok(())
    }

    #[cfg(target_os = "linux")]
    fn speak(&mut self, utterance: &Utterance) -> Result<(), AudioError> {
        use std::process::Command;

        let mut cmd = Command::new("espeak");
        cmd.arg("-a")
            .arg(espeak_amplitude(utterance.volume).to_string())
            .arg("-s")
            .arg(espeak_speed(utterance.rate).to_string())
            .arg("-p")
            .arg(espeak_pitch(utterance.pitch).to_string());
        if let Some(voice) = &utterance.voice {
            cmd.arg("-v").arg(voice);
        }
        let mut child = cmd.arg(&utterance.text).spawn().map_err(AudioError::Spawn)?;

        // Reap in the background so the audio loop is never blocked
        std::thread::spawn(move || {
            if let Err(e) = child.wait() {
                tracing::warn!(error = %e, "espeak did not exit cleanly");
            }
        });
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn speak(&mut self, utterance: &Utterance) -> Result<(), AudioError> {
        let Some(tts) = self.tts.as_mut() else {
            return Err(AudioError::Unavailable {
                reason: "no text-to-speech engine".to_string(),
            });
        };
        let synthesis = |e: tts::Error| AudioError::Synthesis {
            reason: e.to_string(),
        };

        let rate = (tts.normal_rate() * utterance.rate).clamp(tts.min_rate(), tts.max_rate());
        let pitch = (tts.normal_pitch() * utterance.pitch).clamp(tts.min_pitch(), tts.max_pitch());
        let volume = (tts.max_volume() * utterance.volume).clamp(tts.min_volume(), tts.max_volume());
        tts.set_rate(rate).map_err(synthesis)?;
        tts.set_pitch(pitch).map_err(synthesis)?;
        tts.set_volume(volume).map_err(synthesis)?;

        if let Some(name) = &utterance.voice
            && let Ok(voices) = tts.voices()
            && let Some(voice) = voices.iter().find(|v| &v.name() == name)
        {
            tts.set_voice(voice).map_err(synthesis)?;
        }

        tts.speak(&utterance.text, false).map_err(synthesis)?;
        Ok(())
    }
}

fn play_sine(tone: &Tone) -> Result<(), AudioError> {
    let (_stream, handle) = rodio::OutputStream::try_default().map_err(unavailable)?;
    let sink = rodio::Sink::try_new(&handle).map_err(unavailable)?;

    let source = rodio::source::SineWave::new(tone.frequency_hz)
        .take_duration(tone.duration)
        .amplify(tone.volume.clamp(0.0, 1.0));
    sink.append(source);
    sink.sleep_until_end();
    // Let the device drain the tail before the stream is dropped
    std::thread::sleep(Duration::from_millis(20));
    Ok(())
}

fn unavailable(e: impl std::fmt::Display) -> AudioError {
    AudioError::Unavailable {
        reason: e.to_string(),
    }
}

// espeak: amplitude 0-200 (100 normal), speed in wpm (175 normal), pitch 0-99 (50 normal)

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn espeak_amplitude(volume: f32) -> u32 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u32
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn espeak_speed(rate: f32) -> u32 {
    (175.0 * rate.clamp(0.5, 2.0)).round() as u32
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn espeak_pitch(pitch: f32) -> u32 {
    (50.0 * pitch).round().clamp(0.0, 99.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn espeak_parameters_scale_from_normal() {
        assert_eq!(espeak_amplitude(0.8), 80);
        assert_eq!(espeak_speed(1.0), 175);
        assert_eq!(espeak_speed(5.0), 350);
        assert_eq!(espeak_pitch(1.0), 50);
        assert_eq!(espeak_pitch(3.0), 99);
    }
}
