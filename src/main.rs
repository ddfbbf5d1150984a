use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use avatar_lipsync::asset::{AssetStore, HttpAssetSource, Utterance};
use avatar_lipsync::audio::{AudioBackend, AudioOutput, NullBackend, RodioBackend};
use avatar_lipsync::cli::Cli;
use avatar_lipsync::config::Options;
use avatar_lipsync::pipeline::PipelineClient;
use avatar_lipsync::playback::AvatarPlayer;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = cli.merge_into_options(Options::default())?;

    // The output stream is kept alive here for the whole run; players only
    // ever see cloneable handles.
    let mut audio_output = None;
    let backend: Arc<dyn AudioBackend> = if options.silent {
        Arc::new(NullBackend)
    } else {
        match AudioOutput::open() {
            Ok(output) => {
                let backend = Arc::new(RodioBackend::new(output.handle()));
                audio_output = Some(output);
                backend
            }
            Err(e) => {
                warn!(error = %e, "audio device unavailable, animating silently");
                Arc::new(NullBackend)
            }
        }
    };

    let utterance = match &cli.say {
        Some(text) => {
            info!("sending text through the TTS pipeline");
            let pipeline = PipelineClient::new(&options.server_url)?;
            pipeline.say(text)?
        }
        None => Utterance::new(cli.utterance.clone())?,
    };

    let store = AssetStore::new(
        HttpAssetSource::new(&options.server_url)?,
        options.cue_cache_entries,
    );
    let player = AvatarPlayer::new(store, backend, options);

    info!(utterance = %utterance, "starting playback");
    player.speak(utterance);

    // Report mouth and gesture transitions until playback returns to idle.
    let mut last_viseme = None;
    let mut last_gesture = player.gesture().0;
    loop {
        std::thread::sleep(Duration::from_millis(50));

        let viseme = player.active_viseme();
        if viseme != last_viseme {
            match viseme {
                Some(v) => info!(target = v.morph_target(), "viseme"),
                None => info!("viseme neutral"),
            }
            last_viseme = viseme;
        }

        let gesture = player.gesture().0;
        if gesture != last_gesture {
            info!(clip = gesture.clip_name(), "gesture");
            last_gesture = gesture;
        }

        // Idle with the fade back to the idle clip finished.
        if player.is_idle() && !player.gesture().1 {
            break;
        }
    }

    info!("playback finished");
    drop(audio_output);
    Ok(())
}
