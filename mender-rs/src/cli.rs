//! Root CLI structure for mender-rs

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "mender-rs")]
#[command(about = "Pose and inspect tag-linked MD3 character models", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the models of a scene file
    Info {
        /// Scene file (.json, .yaml or .yml)
        scene: PathBuf,
    },

    /// Display the attachment tree of a scene
    Tree {
        /// Scene file (.json, .yaml or .yml)
        scene: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,

        /// Disable colors
        #[arg(long)]
        no_color: bool,

        /// Put key metadata on the node line
        #[arg(long)]
        compact: bool,

        /// Hide per-model metadata
        #[arg(long)]
        no_metadata: bool,
    },

    /// Pose a scene and print where every model ends up
    Pose(PoseArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PoseArgs {
    /// Scene file (.json, .yaml or .yml)
    pub scene: PathBuf,

    /// Keyframe to show on every model
    #[arg(long)]
    pub frame: Option<usize>,

    /// Keyframe to blend towards (defaults to --frame)
    #[arg(long, requires = "frame")]
    pub next_frame: Option<usize>,

    /// Blend factor between --frame and --next-frame
    #[arg(long, default_value_t = 0.0, requires = "frame")]
    pub blend: f32,

    /// Rotation edit as PART=X,Y,Z in degrees (e.g. torso=0,90,0)
    #[arg(long = "rotate", value_name = "PART=X,Y,Z")]
    pub rotations: Vec<String>,

    /// Scale edit as PART=S (e.g. head=1.5)
    #[arg(long = "scale", value_name = "PART=S")]
    pub scales: Vec<String>,

    /// Named animation to play from the scene's animation.cfg (e.g. TORSO_ATTACK)
    #[arg(long = "animation", value_name = "NAME")]
    pub animations: Vec<String>,

    /// Seconds of animation to advance before posing
    #[arg(long, default_value_t = 0.0)]
    pub time: f32,

    /// Report positions before the view rotation is applied
    #[arg(long)]
    pub model_space: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub render: RenderArgs,
}

/// Render switches, mirroring the viewer's toggles
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Draw wireframe instead of solid triangles
    #[arg(long)]
    pub wireframe: bool,

    /// Disable textures
    #[arg(long)]
    pub no_textures: bool,

    /// Disable lighting
    #[arg(long)]
    pub no_lighting: bool,

    /// Show keyframes without blending
    #[arg(long)]
    pub no_interpolation: bool,

    /// Draw mirror reflections
    #[arg(long)]
    pub mirrors: bool,

    /// Draw the flashlight model
    #[arg(long)]
    pub flashlight: bool,

    /// Loop one-shot animations
    #[arg(long)]
    pub anim_loop: bool,

    /// Renormalize blended normals
    #[arg(long)]
    pub renormalize: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}
