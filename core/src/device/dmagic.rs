/// F018-style DMA controller ("DMAgic").
///
/// The register block lives in the core register page (`$FFDx700`). A write
/// to offset 0 latches a job request; the CPU admits it at the next
/// instruction boundary, reads the 11-byte list and runs the transfer while
/// ordinary fetch is suspended.
///
/// # Register map
///
/// | Offset | Read                       | Write                         |
/// |--------|----------------------------|-------------------------------|
/// | 0      | List address bits 7:0      | List address bits 7:0, start  |
/// | 1      | List address bits 15:8     | List address bits 15:8        |
/// | 2      | List address bits 22:16    | List address bits 22:16       |
/// | 3      | Status (7 busy, 0 pending) | ignored                       |
/// | 4      | Completed job count        | ignored                       |
///
/// # List layout
///
/// | Byte | Field                                   |
/// |------|-----------------------------------------|
/// | 0    | Command (1:0 operation, 2 chain)        |
/// | 1-2  | Transfer count, 0 means 65536           |
/// | 3-5  | Source low, high, bank                  |
/// | 6-8  | Destination low, high, bank             |
/// | 9-10 | Modulo                                  |
///
/// Bank byte: bits 3:0 are address bits 19:16, bit 4 hold, bit 5 modulo,
/// bit 6 decrement, bit 7 I/O.
pub struct DmaRegisters {
    list_address: u32,
    pending: bool,
    busy: bool,
    jobs_completed: u8,
}

pub const DMA_LIST_LEN: usize = 11;

const STATUS_BUSY: u8 = 0x80;
const STATUS_PENDING: u8 = 0x01;

const BANK_HOLD: u8 = 0x10;
const BANK_MODULO: u8 = 0x20;
const BANK_DECREMENT: u8 = 0x40;
const BANK_IO: u8 = 0x80;

const CMD_CHAIN: u8 = 0x04;

/// MEGA65 I/O block that `$Dxxx` endpoint addresses land in when the I/O
/// flag is set.
const DMA_IO_BASE: u32 = 0xFFD_3000;

impl DmaRegisters {
    pub fn new() -> Self {
        Self {
            list_address: 0,
            pending: false,
            busy: false,
            jobs_completed: 0,
        }
    }

    pub fn read(&self, offset: u8) -> u8 {
        match offset {
            0 => self.list_address as u8,
            1 => (self.list_address >> 8) as u8,
            2 => (self.list_address >> 16) as u8 & 0x7F,
            3 => {
                let mut status = 0;
                if self.busy {
                    status |= STATUS_BUSY;
                }
                if self.pending {
                    status |= STATUS_PENDING;
                }
                status
            }
            4 => self.jobs_completed,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, offset: u8, data: u8) {
        match offset {
            0 => {
                self.list_address = (self.list_address & !0xFF) | data as u32;
                self.pending = true;
            }
            1 => self.list_address = (self.list_address & !0xFF00) | ((data as u32) << 8),
            2 => {
                self.list_address =
                    (self.list_address & 0xFFFF) | (((data & 0x7F) as u32) << 16);
            }
            _ => {}
        }
    }

    /// List address of a job waiting for admission.
    pub fn pending_request(&self) -> Option<u32> {
        self.pending.then_some(self.list_address)
    }

    /// The CPU has taken the request; status reads busy until completion.
    pub fn admit(&mut self) {
        self.pending = false;
        self.busy = true;
    }

    pub fn complete(&mut self) {
        self.busy = false;
        self.jobs_completed = self.jobs_completed.wrapping_add(1);
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn jobs_completed(&self) -> u8 {
        self.jobs_completed
    }
}

impl Default for DmaRegisters {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DmaCommand {
    Copy,
    /// Minterm mixing is not modeled; performed as a copy.
    Mix,
    Swap,
    Fill,
}

/// One side of a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DmaEndpoint {
    /// 20-bit start address.
    pub address: u32,
    pub hold: bool,
    pub modulo: bool,
    pub decrement: bool,
    pub io: bool,
}

impl DmaEndpoint {
    fn from_bytes(lo: u8, hi: u8, bank: u8) -> Self {
        Self {
            address: ((bank as u32 & 0x0F) << 16) | ((hi as u32) << 8) | lo as u32,
            hold: bank & BANK_HOLD != 0,
            modulo: bank & BANK_MODULO != 0,
            decrement: bank & BANK_DECREMENT != 0,
            io: bank & BANK_IO != 0,
        }
    }

    /// Physical address touched by the `step`-th byte of the transfer.
    pub fn address_at(&self, step: u32, modulo: u16) -> u32 {
        let offset = if self.hold {
            0
        } else if self.modulo && modulo != 0 {
            step % modulo as u32
        } else {
            step
        };
        let addr = if self.decrement {
            self.address.wrapping_sub(offset)
        } else {
            self.address.wrapping_add(offset)
        } & 0xF_FFFF;
        if self.io && addr & 0xF000 == 0xD000 {
            DMA_IO_BASE | (addr & 0x0FFF)
        } else {
            addr
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DmaDescriptor {
    pub command: DmaCommand,
    pub chain: bool,
    pub count: u16,
    pub source: DmaEndpoint,
    pub dest: DmaEndpoint,
    pub modulo: u16,
}

impl DmaDescriptor {
    pub fn parse(list: &[u8; DMA_LIST_LEN]) -> Self {
        let command = match list[0] & 0x03 {
            0 => DmaCommand::Copy,
            1 => DmaCommand::Mix,
            2 => DmaCommand::Swap,
            _ => DmaCommand::Fill,
        };
        Self {
            command,
            chain: list[0] & CMD_CHAIN != 0,
            count: u16::from_le_bytes([list[1], list[2]]),
            source: DmaEndpoint::from_bytes(list[3], list[4], list[5]),
            dest: DmaEndpoint::from_bytes(list[6], list[7], list[8]),
            modulo: u16::from_le_bytes([list[9], list[10]]),
        }
    }

    /// Number of bytes moved; a zero count means a full 64KB.
    pub fn length(&self) -> u32 {
        if self.count == 0 {
            0x1_0000
        } else {
            self.count as u32
        }
    }

    /// Fill jobs take their byte from the source low address.
    pub fn fill_byte(&self) -> u8 {
        self.source.address as u8
    }
}
