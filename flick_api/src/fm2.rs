use std::{
    fs,
    io::{self, BufRead, BufWriter, Write},
    path::Path,
    sync::Arc,
};

use flick_nes::ControllerState;
use flick_timeline::InputTimeline;

use crate::Error;

/// Length of an input line, e.g. `|0|R.......|||`.
const INPUT_LINE_LEN: usize = 14;

/// Header of an FM2 movie.
///
/// Flick only writes single-controller NTSC movies, so most of these fields keep their
/// default values. Unrecognized header lines are preserved in `additional_lines`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fm2Header {
    /// Format version, always 3.
    pub version: u32,
    /// Version of the emulator that recorded the movie.
    pub emu_version: u32,
    /// Number of rerecords.
    pub rerecord_count: u32,
    /// True for PAL timing.
    pub pal_flag: bool,
    /// Name of the ROM the movie was made with.
    pub rom_filename: String,
    /// Checksum of the ROM, e.g. `base64:jjYwGG411HcjG/j9UOVM3Q==`.
    pub rom_checksum: String,
    /// Movie identifier.
    pub guid: String,
    /// Four-player adapter attached.
    pub fourscore: bool,
    /// Famicom microphone used.
    pub microphone: bool,
    /// Device in port 0 (1 = gamepad).
    pub port0: u32,
    /// Device in port 1.
    pub port1: u32,
    /// Expansion port device.
    pub port2: u32,
    /// Famicom Disk System movie.
    pub fds: bool,
    /// Movie recorded with the new PPU core.
    pub new_ppu: bool,
    /// Header lines that are not one of the above keys, in file order.
    pub additional_lines: Vec<String>,
}

impl Default for Fm2Header {
    fn default() -> Self {
        Self {
            version: 3,
            emu_version: 22020,
            rerecord_count: 0,
            pal_flag: false,
            rom_filename: "rom".to_string(),
            rom_checksum: "base64:0000000000000/00000000==".to_string(),
            guid: "00000000-0000-0000-0000-000000000000".to_string(),
            fourscore: false,
            microphone: false,
            port0: 1,
            port1: 0,
            port2: 0,
            fds: false,
            new_ppu: false,
            additional_lines: Vec::new(),
        }
    }
}

impl Fm2Header {
    /// Add a number of rerecords, saturating on overflow.
    pub fn add_rerecords(&mut self, rerecords: u32) -> &mut Self {
        self.rerecord_count = self.rerecord_count.saturating_add(rerecords);
        self
    }

    fn parse_line(&mut self, line: &str, line_number: usize) -> Result<(), Error> {
        let (key, value) = line.split_once(' ').unwrap_or((line, ""));
        let int = || parse_int(value, line_number);
        match key {
            "emuVersion" => self.emu_version = int()?,
            "rerecordCount" => self.rerecord_count = int()?,
            "palFlag" => self.pal_flag = int()? != 0,
            "romFilename" => self.rom_filename = value.to_string(),
            "romChecksum" => self.rom_checksum = value.to_string(),
            "guid" => self.guid = value.to_string(),
            "fourscore" => self.fourscore = int()? != 0,
            "microphone" => self.microphone = int()? != 0,
            "port0" => self.port0 = int()?,
            "port1" => self.port1 = int()?,
            "port2" => self.port2 = int()?,
            "FDS" => self.fds = int()? != 0,
            "NewPPU" => self.new_ppu = int()? != 0,
            _ => self.additional_lines.push(line.to_string()),
        }
        Ok(())
    }
}

fn parse_int(value: &str, line_number: usize) -> Result<u32, Error> {
    value.trim().parse().map_err(|_| Error::InvalidFm2Error {
        line: line_number,
        reason: format!("expected an integer, found '{}'", value),
    })
}

fn parse_input_line(line: &str, line_number: usize) -> Result<ControllerState, Error> {
    let bytes = line.as_bytes();
    if bytes.len() != INPUT_LINE_LEN {
        return Err(Error::InvalidFm2Error {
            line: line_number,
            reason: format!("invalid entry '{}'", line),
        });
    }
    let mut state = ControllerState::empty();
    for (bit, &button) in ControllerState::BUTTONS.iter().enumerate() {
        if bytes[10 - bit] != b'.' {
            state |= button;
        }
    }
    Ok(state)
}

fn input_line(state: ControllerState) -> String {
    format!("|0|{}|||", state)
}

/// Parse an FM2 movie.
///
/// The first input line is the power-on row and is not included in the returned inputs.
pub fn read_fm2(reader: impl BufRead) -> Result<(Fm2Header, InputTimeline), Error> {
    let mut header = Fm2Header::default();
    let mut inputs = InputTimeline::new();
    let mut reading_inputs = false;
    let mut skipped_power_on = false;

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.map_err(|error| Error::Fm2ReadError {
            filename: "<reader>".to_string(),
            error: Arc::new(error),
        })?;
        let line = line.as_str();

        if index == 0 {
            if line != "version 3" {
                return Err(Error::InvalidFm2Error {
                    line: line_number,
                    reason: "unsupported fm2 version".to_string(),
                });
            }
            continue;
        }

        if !reading_inputs {
            if line.starts_with('|') {
                reading_inputs = true;
            } else {
                header.parse_line(line, line_number)?;
                continue;
            }
        }

        let state = parse_input_line(line, line_number)?;
        if skipped_power_on {
            inputs.set(inputs.len() as u32, state);
        }
        skipped_power_on = true;
    }

    Ok((header, inputs))
}

/// Write an FM2 movie, preceded by an idle power-on row.
pub fn write_fm2(
    mut writer: impl Write,
    header: &Fm2Header,
    inputs: &InputTimeline,
) -> io::Result<()> {
    writeln!(writer, "version {}", header.version)?;
    writeln!(writer, "emuVersion {}", header.emu_version)?;
    writeln!(writer, "rerecordCount {}", header.rerecord_count)?;
    writeln!(writer, "palFlag {}", header.pal_flag as u8)?;
    writeln!(writer, "romFilename {}", header.rom_filename)?;
    writeln!(writer, "romChecksum {}", header.rom_checksum)?;
    writeln!(writer, "guid {}", header.guid)?;
    writeln!(writer, "fourscore {}", header.fourscore as u8)?;
    writeln!(writer, "microphone {}", header.microphone as u8)?;
    writeln!(writer, "port0 {}", header.port0)?;
    writeln!(writer, "port1 {}", header.port1)?;
    writeln!(writer, "port2 {}", header.port2)?;
    writeln!(writer, "FDS {}", header.fds as u8)?;
    writeln!(writer, "NewPPU {}", header.new_ppu as u8)?;
    for line in &header.additional_lines {
        writeln!(writer, "{}", line)?;
    }

    writeln!(writer, "{}", input_line(ControllerState::empty()))?;
    for state in inputs.iter() {
        writeln!(writer, "{}", input_line(state))?;
    }
    writer.flush()
}

/// Load an FM2 movie from a file.
///
/// # Panics
///
/// Panics if:
/// - The file doesn't exist or can't be read
/// - The file is an invalid FM2 file
#[track_caller]
pub fn load_fm2(filename: &str) -> (Fm2Header, InputTimeline) {
    match try_load_fm2(filename) {
        Ok(result) => result,
        Err(error) => panic!("Error:\n  {}\n", error),
    }
}

/// Load an FM2 movie from a file.
///
/// Returns an error if:
/// - The file doesn't exist or can't be read
/// - The file is an invalid FM2 file
pub fn try_load_fm2(filename: &str) -> Result<(Fm2Header, InputTimeline), Error> {
    let contents = fs::read_to_string(filename).map_err(|error| Error::Fm2ReadError {
        filename: filename.to_string(),
        error: Arc::new(error),
    })?;
    read_fm2(contents.as_bytes())
}

/// Save an FM2 movie to a file.
///
/// # Panics
///
/// Panics if the file can't be written.
#[track_caller]
pub fn save_fm2(filename: &str, header: &Fm2Header, inputs: &InputTimeline) {
    if let Err(error) = try_save_fm2(filename, header, inputs) {
        panic!("Error:\n  {}\n", error);
    }
}

/// Save an FM2 movie to a file, omitting trailing idle frames.
///
/// Returns an error if the file can't be written.
pub fn try_save_fm2(
    filename: &str,
    header: &Fm2Header,
    inputs: &InputTimeline,
) -> Result<(), Error> {
    save_fm2_impl(filename, header, inputs).map_err(|error| Error::Fm2WriteError {
        filename: filename.to_string(),
        error: Arc::new(error),
    })
}

fn save_fm2_impl(filename: &str, header: &Fm2Header, inputs: &InputTimeline) -> io::Result<()> {
    if let Some(dir) = Path::new(filename).parent() {
        fs::create_dir_all(dir)?;
    }
    let mut inputs = inputs.clone();
    inputs.trim_trailing_idle();
    let f = BufWriter::new(fs::File::create(filename)?);
    write_fm2(f, header, &inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVIE: &str = "version 3\r
emuVersion 22020\r
rerecordCount 12\r
palFlag 0\r
romFilename Super Mario Bros. (JU) [!]\r
romChecksum base64:jjYwGG411HcjG/j9UOVM3Q==\r
guid 00000000-0000-0000-0000-000000000000\r
fourscore 0\r
microphone 0\r
port0 1\r
port1 0\r
port2 0\r
FDS 0\r
NewPPU 0\r
comment author someone\r
|0|........|||\r
|0|.......A|||\r
|0|....T...|||\r
|0|R......A|||\r
";

    #[test]
    fn reads_header_and_inputs() {
        let (header, inputs) = read_fm2(MOVIE.as_bytes()).unwrap();
        assert_eq!(header.rerecord_count, 12);
        assert_eq!(header.rom_filename, "Super Mario Bros. (JU) [!]");
        assert_eq!(header.additional_lines, vec!["comment author someone"]);
        assert_eq!(
            inputs.as_slice(),
            &[
                ControllerState::A,
                ControllerState::START,
                ControllerState::RIGHT | ControllerState::A,
            ]
        );
    }

    #[test]
    fn writes_letter_per_button() {
        let mut out = Vec::new();
        let inputs: InputTimeline = vec![ControllerState::all(), ControllerState::B].into();
        write_fm2(&mut out, &Fm2Header::default(), &inputs).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "version 3");
        assert_eq!(
            &lines[lines.len() - 3..],
            &["|0|........|||", "|0|RLDUTSBA|||", "|0|......B.|||"]
        );
    }

    #[test]
    fn write_then_read_preserves_movie() {
        let (header, inputs) = read_fm2(MOVIE.as_bytes()).unwrap();
        let mut out = Vec::new();
        write_fm2(&mut out, &header, &inputs).unwrap();
        assert_eq!(read_fm2(out.as_slice()).unwrap(), (header, inputs));
    }

    #[test]
    fn rejects_other_versions() {
        assert!(matches!(
            read_fm2("version 2\n".as_bytes()),
            Err(Error::InvalidFm2Error { line: 1, .. })
        ));
    }

    #[test]
    fn rejects_short_input_line() {
        let movie = "version 3\n|0|........|||\n|0|...|||\n";
        assert!(matches!(
            read_fm2(movie.as_bytes()),
            Err(Error::InvalidFm2Error { line: 3, .. })
        ));
    }

    #[test]
    fn rejects_bad_integer() {
        let movie = "version 3\nrerecordCount lots\n";
        assert!(matches!(
            read_fm2(movie.as_bytes()),
            Err(Error::InvalidFm2Error { line: 2, .. })
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies").join("test.fm2");
        let path = path.to_str().unwrap();

        let mut inputs = InputTimeline::idle(40);
        inputs.set(5, ControllerState::A);
        let mut header = Fm2Header::default();
        header.add_rerecords(3);

        try_save_fm2(path, &header, &inputs).unwrap();
        let (loaded_header, loaded_inputs) = try_load_fm2(path).unwrap();
        assert_eq!(loaded_header.rerecord_count, 3);
        assert_eq!(loaded_inputs.len(), 6);
        assert_eq!(loaded_inputs.get(5), ControllerState::A);
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            try_load_fm2("/nonexistent/movie.fm2"),
            Err(Error::Fm2ReadError { .. })
        ));
    }
}
