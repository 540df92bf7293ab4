//! CRC-32 校验和计算.
//!
//! IEEE 802.3 多项式 (反射形式 0xEDB88320), 初始值与输出异或均为 0xFFFFFFFF,
//! 与 zlib / PNG 的 crc32 结果一致. 用于逐帧亮度平面校验.

/// CRC-32 查找表 (反射多项式 0xEDB88320)
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

/// 增量 CRC-32 计算器
///
/// 允许按平面的每一行分段喂入数据, 结果与一次性计算相同.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    /// 创建新的计算器
    pub const fn new() -> Self {
        Self { state: 0xFFFF_FFFF }
    }

    /// 喂入数据
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.state;
        for &byte in data {
            crc = (crc >> 8) ^ CRC32_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize];
        }
        self.state = crc;
    }

    /// 输出最终校验值
    pub const fn finalize(&self) -> u32 {
        self.state ^ 0xFFFF_FFFF
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// 计算 CRC-32
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(data);
    crc.finalize()
}
