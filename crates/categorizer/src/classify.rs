//! The classification pipeline: tally file types by summed size, pick the
//! dominant type, and refine a video-dominant payload into adult content, a
//! series, or a film.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CategorizerError;
use crate::ext::{ext_class, ExtClass};
use crate::groups;
use crate::pathlex;
use crate::patterns::{self, SOFTWARE_RE, TV_RE};
use crate::Result;

/// Videos smaller than this are dropped from the refinement pass whenever at
/// least one video reaches it (50 MiB).
pub const SIZE_THRESH: u64 = 52_428_800;

/// One file of a torrent as reported by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub path: String,
    pub size: u64,
}

impl Record {
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// The closed set of categories a torrent can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Default,
    Av,
    Film,
    Tv,
    Music,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Default => "default",
            Category::Av => "av",
            Category::Film => "film",
            Category::Tv => "tv",
            Category::Music => "music",
        })
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "default" => Ok(Category::Default),
            "av" => Ok(Category::Av),
            "film" => Ok(Category::Film),
            "tv" => Ok(Category::Tv),
            "music" => Ok(Category::Music),
            _ => Err(format!("unknown category: {s}")),
        }
    }
}

/// Classifies torrent file lists against an externally supplied
/// adult-content pattern. The pattern is compiled once per instance.
pub struct Categorizer {
    av: Regex,
}

#[derive(Default)]
struct Tally {
    film: u64,
    music: u64,
    default: u64,
    /// Summed sizes of video files keyed by their canonicalized root, so a
    /// multi-file disc image counts as one logical video.
    videos: HashMap<String, u64>,
}

impl Categorizer {
    /// Build a categorizer from a pattern source string.
    pub fn new(av_pattern: &str) -> Result<Self> {
        Ok(Self {
            av: patterns::compile_external(av_pattern)?,
        })
    }

    /// Build a categorizer from a pattern file (see [`crate::load_pattern`]).
    pub fn from_pattern_file(path: &std::path::Path) -> Result<Self> {
        Self::new(&patterns::load_pattern(path)?)
    }

    /// Classify the files of one torrent. The list must be non-empty; the
    /// result does not depend on record order.
    pub fn classify(&self, files: &[Record]) -> Result<Category> {
        if files.is_empty() {
            return Err(CategorizerError::EmptyFileList);
        }

        let tally = tally_types(files);
        match dominant_type(&tally) {
            Category::Film => self.refine_video(tally),
            other => Ok(other),
        }
    }

    /// Decide between av, tv, and film for a video-dominant payload.
    fn refine_video(&self, tally: Tally) -> Result<Category> {
        let mut videos: Vec<(String, u64)> = tally.videos.into_iter().collect();
        videos.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        // A single undersized clip still gets inspected, but once any video
        // reaches the threshold the small ones are noise.
        if videos.first().is_some_and(|(_, size)| *size >= SIZE_THRESH) {
            videos.retain(|(_, size)| *size >= SIZE_THRESH);
        }

        let paths = strip_common_prefix(videos.into_iter().map(|(path, _)| path).collect());

        for path in &paths {
            if patterns::re_test(&self.av, path) {
                return Ok(Category::Av);
            }
        }
        for path in &paths {
            if patterns::re_test(&TV_RE, path) {
                return Ok(Category::Tv);
            }
        }
        if paths.len() >= 3 && groups::has_sequence(&paths) {
            return Ok(Category::Tv);
        }
        Ok(Category::Film)
    }
}

/// Sum record sizes per type and per canonical video root.
fn tally_types(files: &[Record]) -> Tally {
    let mut tally = Tally::default();
    for record in files {
        let path = pathlex::to_lower(&record.path);
        let (root, ext) = pathlex::split_ext(&path);
        match ext_class(ext) {
            ExtClass::VideoPrimary => {
                tally.film += record.size;
                *tally
                    .videos
                    .entry(pathlex::canonicalize(root, ext))
                    .or_default() += record.size;
            }
            ExtClass::VideoAccessory => tally.film += record.size,
            ExtClass::Audio => tally.music += record.size,
            ExtClass::DiscImage => {
                // An iso is either a software installer or a video image.
                if patterns::re_test(&SOFTWARE_RE, root) {
                    tally.default += record.size;
                } else {
                    tally.film += record.size;
                    *tally.videos.entry(path.clone()).or_default() += record.size;
                }
            }
            ExtClass::Other => tally.default += record.size,
        }
    }
    tally
}

/// The dominant type by summed size. Ties resolve film, then music, then
/// default.
fn dominant_type(tally: &Tally) -> Category {
    let mut chosen = (Category::Film, tally.film);
    for candidate in [(Category::Music, tally.music), (Category::Default, tally.default)] {
        if candidate.1 > chosen.1 {
            chosen = candidate;
        }
    }
    chosen.0
}

/// Remove the longest directory-aligned common ancestor from every path.
/// Paths without a common ancestor (or any path at the top level) are
/// returned unchanged.
fn strip_common_prefix(paths: Vec<String>) -> Vec<String> {
    let components: Vec<Vec<&str>> = paths.iter().map(|p| p.split('/').collect()).collect();
    // The final component is a file identity, never part of the ancestor.
    let Some(deepest) = components.iter().map(|c| c.len() - 1).min() else {
        return paths;
    };
    let mut depth = 0;
    'scan: while depth < deepest {
        let probe = components[0][depth];
        for parts in &components[1..] {
            if parts[depth] != probe {
                break 'scan;
            }
        }
        depth += 1;
    }
    if depth == 0 {
        return paths;
    }
    components
        .into_iter()
        .map(|parts| parts[depth..].join("/"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1 << 30;

    // Stands in for the real externally maintained pattern; matches
    // studio-number tokens like "abp-123".
    const AV_PATTERN: &str = r"\b[a-z]{2,5}-\d{2,5}\b";

    fn categorizer() -> Categorizer {
        Categorizer::new(AV_PATTERN).unwrap()
    }

    fn classify(files: &[(&str, u64)]) -> Category {
        let records: Vec<Record> = files
            .iter()
            .map(|(path, size)| Record::new(*path, *size))
            .collect();
        categorizer().classify(&records).unwrap()
    }

    #[test]
    fn test_empty_list_is_an_error() {
        assert!(matches!(
            categorizer().classify(&[]),
            Err(CategorizerError::EmptyFileList)
        ));
    }

    #[test]
    fn test_av_wins_over_size_heuristics() {
        assert_eq!(classify(&[("Foo/ABP-123.mkv", 2_000_000_000)]), Category::Av);
    }

    #[test]
    fn test_av_wins_over_tv_markers() {
        assert_eq!(
            classify(&[
                ("Studio/ABC-123 s01e01.mkv", 2 * GIB),
                ("Studio/ABC-123 s01e02.mkv", 2 * GIB),
            ]),
            Category::Av
        );
    }

    #[test]
    fn test_series_by_season_episode_marker() {
        assert_eq!(
            classify(&[
                ("Show/Show.S02E01.mkv", 3_000_000_000),
                ("Show/Show.S02E02.mkv", 3_000_000_000),
            ]),
            Category::Tv
        );
    }

    #[test]
    fn test_series_by_episode_prefix() {
        assert_eq!(
            classify(&[
                ("Anime/ep01.mkv", 400_000_000),
                ("Anime/ep02.mkv", 400_000_000),
                ("Anime/ep03.mkv", 400_000_000),
            ]),
            Category::Tv
        );
    }

    #[test]
    fn test_series_by_structural_rule() {
        // No explicit episode marker; three siblings sharing a textual
        // context and differing in one integer run.
        assert_eq!(
            classify(&[
                ("Pack/part 01.mkv", 400_000_000),
                ("Pack/part 02.mkv", 400_000_000),
                ("Pack/part 03.mkv", 400_000_000),
            ]),
            Category::Tv
        );
    }

    #[test]
    fn test_two_siblings_do_not_make_a_series() {
        assert_eq!(
            classify(&[
                ("Pack/alpha one.mkv", 400_000_000),
                ("Pack/alpha two.mkv", 400_000_000),
            ]),
            Category::Film
        );
    }

    #[test]
    fn test_movie_disc_image() {
        assert_eq!(
            classify(&[("MyMovie/MyMovie.iso", 30_000_000_000)]),
            Category::Film
        );
    }

    #[test]
    fn test_software_disc_image() {
        assert_eq!(
            classify(&[("Adobe_Photoshop_v24.1/setup.iso", 3_000_000_000)]),
            Category::Default
        );
    }

    #[test]
    fn test_music_album() {
        let files: Vec<(String, u64)> = (1..=10)
            .map(|n| (format!("Album/{n:02} Title.flac"), 40_000_000))
            .collect();
        let records: Vec<Record> = files
            .iter()
            .map(|(path, size)| Record::new(path.clone(), *size))
            .collect();
        assert_eq!(categorizer().classify(&records).unwrap(), Category::Music);
    }

    #[test]
    fn test_one_large_video_dominates_junk() {
        let mut files = vec![("Pack/feature.mkv", 2 * GIB)];
        let names: Vec<String> = (0..20).map(|n| format!("Pack/readme{n}.txt")).collect();
        for name in &names {
            files.push((name.as_str(), 10_240));
        }
        assert_eq!(classify(&files), Category::Film);
    }

    #[test]
    fn test_size_filter_drops_samples() {
        // The sample clip carries the episode-like numbering; once the
        // feature passes the threshold the sample is not inspected.
        assert_eq!(
            classify(&[
                ("Movie/feature.mkv", 4 * GIB),
                ("Movie/sample/sample ep01.mkv", 30_000_000),
            ]),
            Category::Film
        );
    }

    #[test]
    fn test_all_small_videos_are_kept() {
        // Nothing reaches the threshold, so every clip stays inspected.
        assert_eq!(
            classify(&[
                ("Clips/clip 01.mp4", 9_000_000),
                ("Clips/clip 02.mp4", 9_000_000),
                ("Clips/clip 03.mp4", 9_000_000),
            ]),
            Category::Tv
        );
    }

    #[test]
    fn test_bdmv_streams_collapse_to_one_video() {
        // Numbered stream files would otherwise look like a series.
        assert_eq!(
            classify(&[
                ("Movie/BDMV/STREAM/00001.m2ts", 8 * GIB),
                ("Movie/BDMV/STREAM/00002.m2ts", 8 * GIB),
                ("Movie/BDMV/STREAM/00003.m2ts", 8 * GIB),
                ("Movie/BDMV/index.bdmv", 4_096),
            ]),
            Category::Film
        );
    }

    #[test]
    fn test_video_ts_collapses_to_one_video() {
        assert_eq!(
            classify(&[
                ("Movie/VIDEO_TS/VTS_01_1.VOB", GIB),
                ("Movie/VIDEO_TS/VTS_01_2.VOB", GIB),
                ("Movie/VIDEO_TS/VTS_02_1.VOB", GIB),
                ("Movie/VIDEO_TS/VIDEO_TS.VOB", 100_000_000),
            ]),
            Category::Film
        );
    }

    #[test]
    fn test_dominant_type_tiebreak() {
        // Equal sums resolve film over music over default.
        assert_eq!(
            classify(&[("a/x.mkv", 100), ("a/y.flac", 100)]),
            Category::Film
        );
        assert_eq!(
            classify(&[("a/y.flac", 100), ("a/z.txt", 100)]),
            Category::Music
        );
        assert_eq!(classify(&[("a/z.txt", 200), ("a/y.flac", 100)]), Category::Default);
    }

    #[test]
    fn test_order_independence() {
        let mut files = vec![
            ("Show/Show.S02E01.mkv", 3_000_000_000),
            ("Show/Show.S02E02.mkv", 3_000_000_000),
            ("Show/notes.txt", 1_000),
        ];
        let forward = classify(&files);
        files.reverse();
        assert_eq!(forward, classify(&files));
        assert_eq!(forward, Category::Tv);
    }

    #[test]
    fn test_duplicate_paths_sum() {
        // The same canonical root reported twice tallies once, with sizes
        // summed.
        assert_eq!(
            classify(&[
                ("Movie/BDMV/STREAM/00001.m2ts", 30_000_000),
                ("Movie/BDMV/STREAM/00002.m2ts", 30_000_000),
                ("Movie/BDMV/STREAM/00003.m2ts", 30_000_000),
            ]),
            Category::Film
        );
    }

    #[test]
    fn test_strip_common_prefix() {
        let stripped = strip_common_prefix(vec![
            "show/season 1/ep01".to_string(),
            "show/season 1/ep02".to_string(),
        ]);
        assert_eq!(stripped, vec!["ep01", "ep02"]);

        let unshared = strip_common_prefix(vec!["a/x".to_string(), "b/y".to_string()]);
        assert_eq!(unshared, vec!["a/x", "b/y"]);

        let top_level = strip_common_prefix(vec!["x".to_string(), "y".to_string()]);
        assert_eq!(top_level, vec!["x", "y"]);

        let single = strip_common_prefix(vec!["foo/abp-123".to_string()]);
        assert_eq!(single, vec!["abp-123"]);
    }

    #[test]
    fn test_accessories_count_toward_video_without_being_videos() {
        // Ten subtitle files outweigh one song; the lone video decides the
        // refinement.
        let mut files = vec![("Pack/feature.mkv", 60_000_000), ("Pack/theme.mp3", 50_000_000)];
        let names: Vec<String> = (0..10).map(|n| format!("Pack/sub{n}.srt")).collect();
        for name in &names {
            files.push((name.as_str(), 1_000_000));
        }
        assert_eq!(classify(&files), Category::Film);
    }
}
