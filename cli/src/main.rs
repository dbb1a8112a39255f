//! Format a system described in JSON and print where every tickable lands.
//!
//! Output is one line per tickable, `stave voice index tick x`, followed by
//! the cost of the layout. X is where the tickable is drawn, so
//! center-aligned tickables are reported at the middle of their stave.

mod layout;

use std::{error::Error, fs, path::PathBuf};

use clap::Parser;
use score_spacing::{
    primitives::{Tickable, Ticks},
    System,
};

use crate::layout::Layout;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Layout description (JSON)
    #[arg(value_name = "LAYOUT")]
    layout: PathBuf,

    /// Total stave width; overrides the layout
    #[arg(long)]
    width: Option<f64>,

    /// Tuning steps after formatting; overrides the layout
    #[arg(long)]
    iterations: Option<usize>,

    /// Softmax factor applied to every voice
    #[arg(long)]
    softmax: Option<f64>,

    /// Leave the music left-justified
    #[arg(long, default_value_t = false)]
    no_justify: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let layout: Layout =
        serde_json::from_str(&fs::read_to_string(&args.layout)?)?;
    let mut options = layout.options;
    if let Some(width) = args.width {
        options.width = Some(width);
        options.auto_width = false;
    }
    if let Some(iterations) = args.iterations {
        options.format_iterations = iterations;
    }
    if args.softmax.is_some() {
        options.details.softmax_factor = args.softmax;
    }
    if args.no_justify {
        options.no_justification = true;
    }
    log::debug!("system options: {:?}", options);

    let mut system = System::new(options)?;
    for stave in layout.staves.iter() {
        let voices = stave
            .voices
            .iter()
            .map(|voice| voice.build())
            .collect::<Result<Vec<_>, _>>()?;
        system.add_stave(voices, stave.note_start_x);
    }
    let cost = system.format()?;

    for (stave_index, stave) in system.staves().iter().enumerate() {
        for (voice_index, voice) in stave.voices.iter().enumerate() {
            let mut tick = Ticks::zero();
            for (index, tickable) in voice.tickables().iter().enumerate() {
                let x = system.start_x()
                    + tickable.x()
                    + tickable.center_x_shift();
                println!(
                    "{} {} {} {} {:.3}",
                    stave_index, voice_index, index, tick, x
                );
                tick += tickable.ticks();
            }
        }
    }
    println!("cost {:.4}", cost);
    Ok(())
}
