//! The non-listing output encoders.
//!
//! `a7out` is the octal dump a simulator can load directly.  `ptr`
//! and `rim` are paper-tape images: each 18-bit word becomes three
//! 6-bit frames, high bits first, every frame with the tape's
//! presence bit `0o200` set.  A RIM tape ends with a `jmp` to the
//! program base whose final frame also carries `0o100`, which the
//! hardware Read-In Mode loader takes as halt-and-start.

use std::io::Write;
use std::path::Path;

use tracing::{event, Level};

use super::super::types::{AssemblerFailure, IoAction, IoFailed, IoTarget};
use super::MemoryImage;

fn write_failed(output_file_name: &Path) -> impl Fn(std::io::Error) -> AssemblerFailure + '_ {
    move |error| {
        AssemblerFailure::Io(IoFailed {
            action: IoAction::Write,
            target: IoTarget::File(output_file_name.to_path_buf()),
            error,
        })
    }
}

/// One line per populated cell: location, word, source text.
pub(crate) fn write_octal_dump<W: Write>(
    image: &MemoryImage,
    writer: &mut W,
    output_file_name: &Path,
) -> Result<(), AssemblerFailure> {
    let mut inner = || -> Result<(), std::io::Error> {
        for (location, cell) in image.iter() {
            writeln!(writer, "{location:06o}: {:06o}\t{}", cell.value, cell.source)?;
        }
        Ok(())
    };
    inner().map_err(write_failed(output_file_name))
}

fn frames(word: u32) -> [u8; 3] {
    [
        (((word >> 12) & 0o77) | 0o200) as u8,
        (((word >> 6) & 0o77) | 0o200) as u8,
        ((word & 0o77) | 0o200) as u8,
    ]
}

/// Punch every word from the relocation base up to the highest
/// populated location; holes are punched as zero words.  With
/// `rim_trailer` the halt-and-start word follows.
pub(crate) fn write_tape_frames<W: Write>(
    image: &MemoryImage,
    base: u32,
    rim_trailer: bool,
    writer: &mut W,
    output_file_name: &Path,
) -> Result<(), AssemblerFailure> {
    let mut inner = || -> Result<(), std::io::Error> {
        if let Some(limit) = image.highest_location() {
            event!(
                Level::DEBUG,
                "punching locations {base:06o} through {limit:06o}"
            );
            for location in base..=limit {
                let word = image.get(location).map(|cell| cell.value).unwrap_or(0);
                writer.write_all(&frames(word))?;
            }
        }
        if rim_trailer {
            let mut trailer = frames(0o600000 | base);
            trailer[2] |= 0o100;
            writer.write_all(&trailer)?;
        }
        Ok(())
    };
    inner().map_err(write_failed(output_file_name))
}

#[cfg(test)]
mod tests {
    use super::{frames, write_tape_frames};
    use crate::driver::MemoryImage;
    use std::path::Path;

    fn image_with(cells: &[(u32, u32)]) -> MemoryImage {
        let mut image = MemoryImage::default();
        for (location, value) in cells {
            image.store(*location, *value, "");
        }
        image
    }

    #[test]
    fn frames_split_high_bits_first() {
        assert_eq!(frames(0o123456), [0o212, 0o234, 0o256]);
        assert_eq!(frames(0), [0o200, 0o200, 0o200]);
    }

    #[test]
    fn holes_are_punched_as_zero_words() {
        let image = image_with(&[(0o10000, 0o740040), (0o10002, 0o200005)]);
        let mut out: Vec<u8> = Vec::new();
        write_tape_frames(&image, 0o10000, false, &mut out, Path::new("test"))
            .expect("writing to a vec cannot fail");
        assert_eq!(out.len(), 9);
        assert_eq!(&out[3..6], &frames(0));
    }

    #[test]
    fn the_rim_stream_is_the_ptr_stream_plus_the_trailer() {
        let image = image_with(&[(0o10000, 0o200005)]);
        let mut ptr: Vec<u8> = Vec::new();
        let mut rim: Vec<u8> = Vec::new();
        write_tape_frames(&image, 0o10000, false, &mut ptr, Path::new("test"))
            .expect("writing to a vec cannot fail");
        write_tape_frames(&image, 0o10000, true, &mut rim, Path::new("test"))
            .expect("writing to a vec cannot fail");
        assert_eq!(&rim[..ptr.len()], ptr.as_slice());
        let mut trailer = frames(0o610000);
        trailer[2] |= 0o100;
        assert_eq!(&rim[ptr.len()..], &trailer);
    }

    #[test]
    fn an_empty_image_punches_nothing_but_the_trailer() {
        let image = MemoryImage::default();
        let mut ptr: Vec<u8> = Vec::new();
        let mut rim: Vec<u8> = Vec::new();
        write_tape_frames(&image, 0o10000, false, &mut ptr, Path::new("test"))
            .expect("writing to a vec cannot fail");
        write_tape_frames(&image, 0o10000, true, &mut rim, Path::new("test"))
            .expect("writing to a vec cannot fail");
        assert!(ptr.is_empty());
        assert_eq!(rim.len(), 3);
    }
}
