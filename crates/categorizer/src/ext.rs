//! Extension taxonomy. Lowercased, dotless extensions are partitioned into
//! the classes the type tally works with. `iso` is dual-use (software or
//! video image) and is resolved separately by the classifier.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExtClass {
    VideoPrimary,
    VideoAccessory,
    Audio,
    DiscImage,
    Other,
}

pub(crate) fn ext_class(ext: &str) -> ExtClass {
    if ext == "iso" {
        return ExtClass::DiscImage;
    }
    if is_video_primary(ext) {
        return ExtClass::VideoPrimary;
    }
    if is_video_accessory(ext) {
        return ExtClass::VideoAccessory;
    }
    if is_audio(ext) {
        return ExtClass::Audio;
    }
    ExtClass::Other
}

fn is_video_primary(ext: &str) -> bool {
    matches!(
        ext,
        "3gp" | "3g2" | "3gpp" | "asf" | "avi" | "divx" | "dpg" | "evo" | "flv"
            | "f4v" | "ifo" | "k3g" | "m1v" | "m2v" | "m4v" | "mkv" | "m4k"
            | "mov" | "mp2v" | "m2ts" | "m2t" | "m4b" | "m4p" | "mp4" | "mpeg"
            | "mpg" | "mpv" | "mpv2" | "mxf" | "nsr" | "nsv" | "ogv" | "ogm"
            | "rm" | "rmvb" | "ram" | "skm" | "swf" | "tp" | "tpr" | "ts"
            | "vob" | "webm" | "wmv" | "wmp" | "wtv"
    )
}

fn is_video_accessory(ext: &str) -> bool {
    matches!(
        ext,
        "ass" | "xss" | "asx" | "bdjo" | "bdmv" | "clpi" | "idx" | "mpl"
            | "mpls" | "psb" | "rt" | "sbv" | "smi" | "srr" | "srt" | "ssa"
            | "ssf" | "sub" | "sup" | "ttml" | "usf" | "vtt" | "wmx" | "wvx"
    )
}

fn is_audio(ext: &str) -> bool {
    matches!(
        ext,
        "aac" | "ac3" | "aiff" | "alac" | "amr" | "ape" | "cda" | "cue"
            | "dsf" | "dts" | "dtshd" | "eac3" | "flac" | "m3u" | "m3u8"
            | "m4a" | "m1a" | "m2a" | "ma" | "mka" | "mod" | "mp2" | "mp3"
            | "mpc" | "ogg" | "opus" | "pls" | "rma" | "tak" | "tta" | "wav"
            | "wax" | "wma" | "xspf"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ext_class() {
        assert_eq!(ext_class("mkv"), ExtClass::VideoPrimary);
        assert_eq!(ext_class("m2ts"), ExtClass::VideoPrimary);
        assert_eq!(ext_class("vob"), ExtClass::VideoPrimary);
        assert_eq!(ext_class("srt"), ExtClass::VideoAccessory);
        assert_eq!(ext_class("flac"), ExtClass::Audio);
        assert_eq!(ext_class("iso"), ExtClass::DiscImage);
        assert_eq!(ext_class("txt"), ExtClass::Other);
        assert_eq!(ext_class(""), ExtClass::Other);
    }

    #[test]
    fn test_video_wins_over_audio_duplicates() {
        // A few extensions appear in published lists for both media kinds;
        // the video class takes precedence.
        assert_eq!(ext_class("wmv"), ExtClass::VideoPrimary);
        assert_eq!(ext_class("m4k"), ExtClass::VideoPrimary);
    }
}
