// 48bit線形合同法による一様乱数（erand48互換）
// 領域の行ごとにシードを固定するため、スケジューリング順に依存せず結果が再現できる

const MULTIPLIER: u64 = 0x5_DEEC_E66D;
const INCREMENT: u64 = 0xB;
const MASK: u64 = (1 << 48) - 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erand48 {
    state: u64,
}

impl Erand48 {
    /// 3つの16bitワード（下位から）でシード
    pub fn new(seed: [u16; 3]) -> Self {
        let state = u64::from(seed[0]) | (u64::from(seed[1]) << 16) | (u64::from(seed[2]) << 32);
        Self { state }
    }

    /// 画像の行番号からシードを作る（`{0, 0, row^3}` の下位16bit）
    pub fn for_row(row: usize) -> Self {
        let cube = (row as u64).wrapping_mul(row as u64).wrapping_mul(row as u64);
        Self::new([0, 0, cube as u16])
    }

    /// [0, 1) の一様乱数
    pub fn next_f64(&mut self) -> f64 {
        self.state = MULTIPLIER.wrapping_mul(self.state).wrapping_add(INCREMENT) & MASK;
        self.state as f64 / (1u64 << 48) as f64
    }
}
