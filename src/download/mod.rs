mod engine;
mod options;
mod request;
mod worker;
mod ytdlp;

pub use engine::{
    is_access_restricted, is_item_failure, is_skip_message, Cancelled, Engine, EngineError,
    EngineHooks, EngineProgress, ProgressStatus,
};
pub use options::{video_format_ladder, AudioExtract, CookieSource, EngineConfig, ALTERNATE_CLIENT};
pub use request::{DownloadRequest, MAX_HEIGHT, MIN_HEIGHT};
pub use worker::{
    run, CancelToken, DownloadWorker, Outcome, ProgressEvent, WorkerEvent, CANCELLED_MESSAGE,
    NO_MEDIA_MESSAGE, NO_TRANSCODER_MESSAGE,
};
pub use ytdlp::YtDlp;
