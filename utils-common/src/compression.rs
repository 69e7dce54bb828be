use std::io::{Read, Write};
use flate2::{Compression, write::GzEncoder, read::GzDecoder};
use log::debug;

use crate::error::{CatalogError, Result};

/// 魔数常量 - 用于标识快照格式
pub const MAGIC_BYTES: &[u8] = b"REVCAT";

/// 当前快照格式版本
pub const SNAPSHOT_VERSION: [u8; 2] = [1, 0];

/// 默认支持的最大主版本
pub const MAX_SUPPORTED_VERSION: u8 = 1;

// 预分配时假设的最大压缩比
const MAX_EXPANSION_RATIO: usize = 32;

// 魔数 + 版本号 + 原始大小
const HEADER_LEN: usize = MAGIC_BYTES.len() + 2 + 4;

/// 将对象序列化为二进制格式
pub fn to_binary<T: serde::Serialize>(obj: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(obj, bincode::config::standard())
        .map_err(|e| CatalogError::Encode(e.to_string()))
}

/// 从二进制格式反序列化对象
pub fn from_binary<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
    bincode::serde::decode_from_slice(data, bincode::config::standard())
        .map_err(|e| CatalogError::Decode(e.to_string()))
        .map(|(value, _)| value)
}

/// 将对象序列化为压缩的二进制格式
pub fn to_compressed<T: serde::Serialize>(obj: &T, version: [u8; 2]) -> Result<Vec<u8>> {
    let binary = to_binary(obj)?;
    let data_len = u32::try_from(binary.len())
        .map_err(|_| CatalogError::Encode(format!("数据过大: {} 字节", binary.len())))?;

    let mut output = Vec::with_capacity(HEADER_LEN + binary.len() / 2);
    output.extend_from_slice(MAGIC_BYTES);
    output.extend_from_slice(&version);
    output.extend_from_slice(&data_len.to_le_bytes());

    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&binary)?;
    let compressed_data = encoder.finish()?;
    output.extend_from_slice(&compressed_data);

    debug!(
        "快照压缩完成: 原始 {} 字节, 压缩后 {} 字节",
        binary.len(),
        output.len()
    );

    Ok(output)
}

/// 从压缩的二进制格式反序列化对象，使用默认最大版本
pub fn from_compressed<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
    from_compressed_with_max_version(data, MAX_SUPPORTED_VERSION)
}

/// 从压缩的二进制格式反序列化对象，允许指定支持的最大版本
pub fn from_compressed_with_max_version<T: serde::de::DeserializeOwned>(
    data: &[u8],
    max_version: u8,
) -> Result<T> {
    read_version(data, max_version)?;

    let size_offset = MAGIC_BYTES.len() + 2;
    let mut size_bytes = [0u8; 4];
    size_bytes.copy_from_slice(&data[size_offset..HEADER_LEN]);
    let declared_size = u32::from_le_bytes(size_bytes);
    let original_size = declared_size as usize;

    // 头部记录的大小不可信：预留空间受压缩数据长度限制，最多多读一个字节用于发现不一致
    let capacity = original_size.min(data.len().saturating_mul(MAX_EXPANSION_RATIO));
    let mut decoder = GzDecoder::new(&data[HEADER_LEN..]).take(u64::from(declared_size) + 1);
    let mut decompressed_data = Vec::with_capacity(capacity);
    decoder.read_to_end(&mut decompressed_data)?;

    if decompressed_data.len() != original_size {
        return Err(CatalogError::SizeMismatch {
            expected: original_size,
            actual: decompressed_data.len(),
        });
    }

    from_binary(&decompressed_data)
}

/// 验证压缩数据头部是否有效，返回版本号
pub fn validate_compressed_data(data: &[u8]) -> Result<[u8; 2]> {
    read_version(data, MAX_SUPPORTED_VERSION)
}

// 检查长度、魔数和版本
fn read_version(data: &[u8], max_version: u8) -> Result<[u8; 2]> {
    if data.len() < HEADER_LEN {
        return Err(CatalogError::TooShort(data.len()));
    }

    if &data[..MAGIC_BYTES.len()] != MAGIC_BYTES {
        return Err(CatalogError::BadMagic);
    }

    let version_offset = MAGIC_BYTES.len();
    let version = [data[version_offset], data[version_offset + 1]];
    if version[0] > max_version {
        return Err(CatalogError::UnsupportedVersion {
            major: version[0],
            minor: version[1],
        });
    }

    Ok(version)
}
