use std::fs::File;
use std::io::{Read, stdin};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use zsmplay::ZsmHeader;
use zsmplay::zsm::{ZSM_HEADER_SIZE, ZsmCommand};

use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};

/// Gzip stream magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Low 6 bits of an extension operand give the payload length
const EXTENSION_LENGTH_MASK: u8 = 0x3F;

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .context("failed to decompress gzip data")?;
    Ok(out)
}

/// Read ZSM bytes from a path or stdin ('-') into a Vec<u8>.
///
/// Gzipped input (`.gz` extension or gzip magic bytes) is decompressed.
pub fn read_zsm_as_vec(path: &PathBuf) -> Result<Vec<u8>> {
    let mut inbuf = Vec::new();

    if path == Path::new("-") {
        stdin()
            .read_to_end(&mut inbuf)
            .context("failed to read from stdin")?;
    } else {
        let mut f = File::open(path)
            .with_context(|| format!("failed to open input file: {}", path.display()))?;
        f.read_to_end(&mut inbuf)
            .with_context(|| format!("failed to read input file: {}", path.display()))?;
    }

    let has_gz_extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    if has_gz_extension || is_gzip(&inbuf) {
        gunzip(&inbuf)
    } else {
        Ok(inbuf)
    }
}

/// One decoded command with its absolute offset and operand bytes.
pub struct Decoded<'a> {
    pub offset: usize,
    pub command: ZsmCommand,
    pub operands: &'a [u8],
}

/// Walk the command stream from just past the header up to and including
/// the first end-of-stream command. Stops early at truncated data.
pub fn decode_commands(data: &[u8]) -> Vec<Decoded<'_>> {
    let mut decoded = Vec::new();
    let mut offset = ZSM_HEADER_SIZE;

    while let Some(&byte) = data.get(offset) {
        let command = ZsmCommand::from_byte(byte);
        let mut len = command.operand_len();
        if command == ZsmCommand::Extension {
            // Operand byte plus the payload it announces
            len += data
                .get(offset + 1)
                .map(|&b| (b & EXTENSION_LENGTH_MASK) as usize)
                .unwrap_or(0);
        }

        let start = offset + 1;
        let Some(operands) = data.get(start..start + len) else {
            eprintln!("command at 0x{:06X} runs past the end of data", offset);
            break;
        };

        decoded.push(Decoded {
            offset,
            command,
            operands,
        });
        offset = start + len;

        if command == ZsmCommand::EndOfStream {
            break;
        }
    }

    decoded
}

/// Ticks of delay in one pass of the stream.
fn total_ticks(commands: &[Decoded<'_>]) -> u64 {
    commands
        .iter()
        .map(|d| match d.command {
            ZsmCommand::Delay { ticks } => ticks as u64,
            _ => 0,
        })
        .sum()
}

fn parse_header(path: &Path, data: &[u8]) -> Result<ZsmHeader> {
    ZsmHeader::try_from(data)
        .with_context(|| format!("failed to parse ZSM header: {}", path.display()))
}

fn channel_list(mask: u16, count: u8) -> String {
    let channels: Vec<String> = (0..count)
        .filter(|ch| mask & (1 << ch) != 0)
        .map(|ch| ch.to_string())
        .collect();
    if channels.is_empty() {
        "(none)".to_string()
    } else {
        channels.join(" ")
    }
}

/// Print a header summary for a ZSM stream.
pub fn info(path: &Path, data: Vec<u8>) -> Result<()> {
    let header = parse_header(path, &data)?;
    let commands = decode_commands(&data);
    let ticks = total_ticks(&commands);
    let seconds = if header.tick_rate == 0 {
        0.0
    } else {
        ticks as f64 / header.tick_rate as f64
    };
    let terminated = commands
        .last()
        .is_some_and(|d| d.command == ZsmCommand::EndOfStream);

    let rows = vec![
        (
            "Magic",
            format!(
                "0x{:04X}{}",
                header.magic,
                if header.has_valid_magic() { "" } else { " (unexpected)" }
            ),
        ),
        ("Version", format!("{}", header.version)),
        (
            "Loop point",
            if header.has_loop_point() {
                format!(
                    "bank 0x{:02X} address 0x{:04X} (0x{:06X})",
                    header.loop_point.bank,
                    header.loop_point.address,
                    header.loop_point.absolute()
                )
            } else {
                "(none)".to_string()
            },
        ),
        ("PCM offset", format!("0x{:06X}", header.pcm_offset.absolute())),
        (
            "FM channels",
            format!(
                "0x{:02X} [{}]",
                header.fm_channel_mask,
                channel_list(header.fm_channel_mask as u16, 8)
            ),
        ),
        (
            "PSG channels",
            format!(
                "0x{:04X} [{}]",
                header.psg_channel_mask,
                channel_list(header.psg_channel_mask, 16)
            ),
        ),
        ("Tick rate", format!("{} Hz", header.tick_rate)),
        ("Size", format!("{} bytes", data.len())),
        ("Commands", format!("{}", commands.len())),
        (
            "Length",
            format!(
                "{} ticks ({:.3} s){}",
                ticks,
                seconds,
                if terminated { "" } else { ", no end-of-stream" }
            ),
        ),
    ];

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Field"), Cell::new("Value")]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }

    println!("\"{}\"", path.display());
    println!("{}", table);
    Ok(())
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print every command of one pass with its offset.
pub fn dump(path: &Path, data: Vec<u8>) -> Result<()> {
    parse_header(path, &data)?;

    println!("{:<10} {:<6} {:<28} Operands", "Offset", "Byte", "Command");
    println!("{}", "-".repeat(72));

    for Decoded {
        offset,
        command,
        operands,
    } in decode_commands(&data)
    {
        let detail = match command {
            ZsmCommand::PsgWrite { address } => format!(
                "PSG ch{} reg{} = 0x{:02X}",
                address >> 2,
                address & 0x03,
                operands[0]
            ),
            ZsmCommand::Extension => format!(
                "EXT ch{} len{}",
                operands[0] >> 6,
                operands[0] & EXTENSION_LENGTH_MASK
            ),
            ZsmCommand::FmWrite { pairs } => format!("FM x{}", pairs),
            ZsmCommand::EndOfStream => "EOF".to_string(),
            ZsmCommand::Delay { ticks } => format!("WAIT {}", ticks),
        };
        let operand_str = match command {
            ZsmCommand::FmWrite { .. } => operands
                .chunks(2)
                .map(|pair| format!("{:02X}={:02X}", pair[0], pair[1]))
                .collect::<Vec<_>>()
                .join(" "),
            _ => hex_bytes(operands),
        };

        println!(
            "0x{:06X}   {:02X}     {:<28} {}",
            offset,
            data[offset],
            detail,
            operand_str
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zsmplay::ZsmBuilder;

    #[test]
    fn decodes_until_end_of_stream() {
        let mut builder = ZsmBuilder::new();
        builder
            .psg_write(0x02, 0x3F)
            .extension(1, &[0xAA, 0xBB])
            .fm_write(&[(0x20, 0xC7)])
            .delay(3);
        let mut bytes = builder.finalize();
        bytes.extend_from_slice(&[0x00, 0x01]);

        let commands = decode_commands(&bytes);
        let kinds: Vec<ZsmCommand> = commands.iter().map(|d| d.command).collect();
        assert_eq!(
            kinds,
            vec![
                ZsmCommand::PsgWrite { address: 0x02 },
                ZsmCommand::Extension,
                ZsmCommand::FmWrite { pairs: 1 },
                ZsmCommand::Delay { ticks: 3 },
                ZsmCommand::EndOfStream,
            ]
        );
        assert_eq!(commands[1].operands, &[0x42, 0xAA, 0xBB]);
        assert_eq!(total_ticks(&commands), 3);
    }

    #[test]
    fn truncated_command_stops_decoding() {
        let mut bytes = ZsmHeader::new().to_bytes().to_vec();
        bytes.extend_from_slice(&[0x81, 0x42, 0x20]);
        let commands = decode_commands(&bytes);
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn gzip_roundtrip() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let raw = ZsmBuilder::new().finalize();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).unwrap();
        let gz = encoder.finish().unwrap();

        assert!(is_gzip(&gz));
        assert_eq!(gunzip(&gz).unwrap(), raw);
    }
}
