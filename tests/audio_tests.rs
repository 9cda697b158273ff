//! Audio Tests
//!
//! Renders the chord end to end and checks the encoded WAV with hound.

use std::io::Cursor;

use approx::assert_abs_diff_eq;
use stillness::audio::{
    decode_wav, encode_wav, AudioBuffer, LoopPlayer, NativeRenderer, OfflineRenderer, Player,
    RenderFormat, ToneSynthesizer, Voice,
};
use stillness::config::ToneConfig;
use test_case::test_case;

fn scaled(sample: f32) -> f32 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    }
}

#[test_case(8000 ; "8 kHz")]
#[test_case(44100 ; "44.1 kHz")]
#[test_case(48000 ; "48 kHz")]
fn test_rendered_loop_decodes_with_hound(sample_rate: u32) {
    let asset = ToneSynthesizer::default()
        .synthesize(&NativeRenderer, sample_rate)
        .unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(asset.encoded_bytes())).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, sample_rate);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    assert_eq!(reader.duration() as usize, sample_rate as usize * 4);

    let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    let source = asset.buffer().to_interleaved();
    assert_eq!(decoded.len(), source.len());
    for (got, want) in decoded.iter().zip(&source) {
        assert!((*got as f32 - scaled(*want)).abs() < 1.0);
    }
}

#[test]
fn test_rendering_is_deterministic() {
    let synth = ToneSynthesizer::default();
    let first = synth.synthesize(&NativeRenderer, 8000).unwrap();
    let second = synth.synthesize(&NativeRenderer, 8000).unwrap();
    assert_eq!(first.checksum(), second.checksum());
    assert_eq!(first.encoded_bytes(), second.encoded_bytes());
}

#[test]
fn test_both_channels_carry_the_same_mix() {
    let asset = ToneSynthesizer::default()
        .synthesize(&NativeRenderer, 8000)
        .unwrap();
    let (_, samples) = decode_wav(asset.encoded_bytes()).unwrap();
    for frame in samples.chunks_exact(2) {
        assert_eq!(frame[0], frame[1]);
    }
}

#[test]
fn test_loop_starts_silent_and_fades_out() {
    let rate = 8000;
    let asset = ToneSynthesizer::default()
        .synthesize(&NativeRenderer, rate)
        .unwrap();
    let left = asset.buffer().channel(0);

    assert_eq!(left[0], 0.0);

    // Loudest point is near the end of the attack
    let attack_end = (0.02 * rate as f64) as usize;
    let early_peak = left[..attack_end * 4]
        .iter()
        .fold(0.0f32, |peak, s| peak.max(s.abs()));
    let tail_peak = left[left.len() - rate as usize / 10..]
        .iter()
        .fold(0.0f32, |peak, s| peak.max(s.abs()));
    assert!(early_peak > 0.05);
    assert!(tail_peak < 0.001);
    assert!(asset.buffer().peak() <= 0.2 + 1e-4);
}

#[test]
fn test_envelope_shape_at_render_resolution() {
    let envelope = ToneSynthesizer::default().voice_envelope();
    let rate = 48000.0;
    let attack_end = (0.02 * rate) as usize;

    assert_eq!(envelope.value_at(0.0), 0.0);
    let mut previous = 0.0f32;
    for k in 1..=attack_end {
        let value = envelope.value_at(k as f64 / rate);
        assert!(value > previous);
        previous = value;
    }
    for k in attack_end + 1..(4.0 * rate) as usize {
        let value = envelope.value_at(k as f64 / rate);
        assert!(value <= previous + f32::EPSILON);
        previous = value;
    }
    assert_abs_diff_eq!(envelope.value_at(4.0), 0.0001, epsilon = 1e-7);
}

#[test]
fn test_custom_tone_shape() {
    let tone = ToneConfig {
        frequencies: vec![440.0],
        duration_secs: 1,
        channels: 1,
        ..ToneConfig::default()
    };
    let synth = ToneSynthesizer::new(tone);
    let asset = synth.synthesize(&NativeRenderer, 8000).unwrap();
    assert_eq!(asset.channels(), 1);
    assert_eq!(asset.frames(), 8000);
    assert_eq!(asset.encoded_bytes().len(), 44 + 8000 * 2);
}

#[test]
fn test_short_renderer_output_is_rejected() {
    struct Truncating;
    impl OfflineRenderer for Truncating {
        fn render(
            &self,
            voices: &[Voice],
            mut format: RenderFormat,
        ) -> stillness::Result<AudioBuffer> {
            format.frames /= 2;
            NativeRenderer.render(voices, format)
        }
    }

    let err = ToneSynthesizer::default()
        .synthesize(&Truncating, 8000)
        .unwrap_err();
    assert!(err.disables_audio());
}

#[test]
fn test_loop_player_reads_encoded_loop() {
    let buffer = AudioBuffer::from_channels(
        vec![vec![0.5, -0.5, 1.0], vec![-1.0, 0.0, 0.25]],
        8000,
    )
    .unwrap();
    let bytes = encode_wav(&buffer).unwrap();
    let mut player = LoopPlayer::from_wav(&bytes).unwrap();
    assert_eq!(player.channels(), 2);
    assert_eq!(player.frames(), 3);

    player.play().unwrap();
    let mut out = vec![0.0f32; 8];
    player.fill(&mut out);
    assert_abs_diff_eq!(out[0], 0.5, epsilon = 1e-4);
    assert_abs_diff_eq!(out[1], -1.0, epsilon = 1e-4);
    // wraps around to the first frame
    assert_abs_diff_eq!(out[6], 0.5, epsilon = 1e-4);
}
