use serde::Deserialize;

/// The daemon's numeric torrent status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "i64")]
pub enum TorrentStatus {
    Stopped,
    CheckWait,
    Check,
    DownloadWait,
    Download,
    SeedWait,
    Seed,
    #[default]
    Unknown,
}

impl From<i64> for TorrentStatus {
    fn from(code: i64) -> Self {
        match code {
            0 => TorrentStatus::Stopped,
            1 => TorrentStatus::CheckWait,
            2 => TorrentStatus::Check,
            3 => TorrentStatus::DownloadWait,
            4 => TorrentStatus::Download,
            5 => TorrentStatus::SeedWait,
            6 => TorrentStatus::Seed,
            _ => TorrentStatus::Unknown,
        }
    }
}

impl TorrentStatus {
    pub fn is_stopped(self) -> bool {
        self == TorrentStatus::Stopped
    }

    /// True once the daemon is done writing payload data: stopped, queued to
    /// seed, or seeding.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            TorrentStatus::Stopped | TorrentStatus::SeedWait | TorrentStatus::Seed
        )
    }
}

/// One file of a torrent as reported by `torrent-get`.
#[derive(Debug, Clone, Deserialize)]
pub struct TorrentFile {
    pub name: String,
    pub length: u64,
}

/// A torrent as reported by `torrent-get`. Only requested fields are
/// present on the wire; everything defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Torrent {
    pub id: i64,
    pub name: String,
    pub download_dir: String,
    pub percent_done: f64,
    pub size_when_done: u64,
    pub status: TorrentStatus,
    pub activity_date: i64,
    pub files: Vec<TorrentFile>,
}
