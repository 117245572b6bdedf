use argh::FromArgs;
use std::path::PathBuf;

use mono3d::data::{
    batch::encode_batch,
    config::{DatasetConfig, Mode, Split},
    debug::DirectorySink,
    transforms::NormalizeMeanStd,
    KittiDataset, SampleTarget,
};

#[derive(FromArgs)]
/// Encode a KITTI split into training targets and print a summary per sample
struct Args {
    /// path to a JSON dataset config; other options override it
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// root of the KITTI object training directory
    #[argh(option, short = 'r')]
    root: Option<PathBuf>,

    /// split to read: train, val, trainval or test
    #[argh(option, short = 's')]
    split: Option<String>,

    /// encode for inference, without annotations
    #[argh(switch)]
    inference: bool,

    /// number of samples to encode
    #[argh(option, short = 'n', default = "8")]
    num_samples: usize,

    /// seed of the augmentation streams
    #[argh(option, default = "0")]
    seed: u64,

    /// directory receiving keypoint visualizations
    #[argh(option)]
    debug_dir: Option<PathBuf>,

    /// normalize the images with ImageNet statistics
    #[argh(switch)]
    normalize: bool,
}

fn parse_split(name: &str) -> Result<Split, Box<dyn std::error::Error>> {
    match name {
        "train" => Ok(Split::Train),
        "val" => Ok(Split::Val),
        "trainval" => Ok(Split::TrainVal),
        "test" => Ok(Split::Test),
        _ => Err(format!("unknown split: {name}").into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => DatasetConfig::from_json_file(path)?,
        None => DatasetConfig::default(),
    };
    if let Some(root) = args.root {
        config.root = root;
    }
    if let Some(split) = &args.split {
        config.split = parse_split(split)?;
    }
    if args.inference {
        config.mode = Mode::Inference;
    }

    let mut dataset = KittiDataset::new(config)?;
    if let Some(dir) = &args.debug_dir {
        dataset = dataset.with_debug_sink(DirectorySink::new(dir)?);
    }
    if args.normalize {
        dataset = dataset.with_transforms(NormalizeMeanStd::imagenet());
    }

    let indices = (0..args.num_samples.min(dataset.len())).collect::<Vec<_>>();
    let start = std::time::Instant::now();
    let samples = encode_batch(&dataset, &indices, args.seed);
    log::info!(
        "encoded {} samples in {:?}",
        samples.len(),
        start.elapsed()
    );

    for sample in samples {
        let sample = match sample {
            Ok(sample) => sample,
            Err(e) => {
                log::error!("failed to encode sample: {e}");
                continue;
            }
        };

        match &sample.target {
            SampleTarget::Train(t) => {
                let objects = t.buffers.cls_ids.len();
                let valid = t.buffers.reg_mask.iter().filter(|&&m| m == 1).count();
                let peak = t
                    .buffers
                    .heatmaps
                    .iter()
                    .flat_map(|hm| hm.as_slice().iter().copied())
                    .fold(0.0f32, f32::max);
                println!(
                    "{}: image {} | {} slots, {} with regression | heatmap peak {:.2}",
                    sample.frame_id,
                    sample.image.size(),
                    objects,
                    valid,
                    peak
                );
            }
            SampleTarget::Inference(meta) => {
                println!(
                    "{}: image {} | source size {:?} | trans_mat {:?}",
                    sample.frame_id,
                    sample.image.size(),
                    meta.image_size,
                    meta.trans_mat
                );
            }
        }
    }

    Ok(())
}
