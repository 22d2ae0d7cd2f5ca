pub(crate) mod ffmpeg;
pub(crate) mod scripted;
pub(crate) mod session;
