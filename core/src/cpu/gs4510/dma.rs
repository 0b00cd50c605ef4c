use log::debug;

use super::exec::{CycleEvent, DmaJob, DmaPhase, ExecState, Step};
use crate::device::dmagic::{DMA_LIST_LEN, DmaCommand, DmaDescriptor};
use crate::memory::arbiter::PHYS_MASK;

impl DmaPhase {
    fn first(command: DmaCommand) -> Self {
        match command {
            DmaCommand::Copy | DmaCommand::Mix => DmaPhase::Read,
            DmaCommand::Fill => DmaPhase::Fill,
            DmaCommand::Swap => DmaPhase::SwapReadSource,
        }
    }
}

impl Step<'_> {
    /// One list byte per cycle. The read for `index` was issued on the
    /// previous cycle.
    pub(super) fn dma_list_read(
        &mut self,
        list: u32,
        index: u8,
        mut bytes: [u8; DMA_LIST_LEN],
    ) -> ExecState {
        bytes[index as usize] = self.input.data;
        let next = index as usize + 1;
        if next < DMA_LIST_LEN {
            self.read_phys((list + next as u32) & PHYS_MASK);
            return ExecState::DmaListRead {
                list,
                index: next as u8,
                bytes,
            };
        }

        let descriptor = DmaDescriptor::parse(&bytes);
        debug!(
            "DMA {:?} {} bytes {:05X} -> {:05X}{}",
            descriptor.command,
            descriptor.length(),
            descriptor.source.address,
            descriptor.dest.address,
            if descriptor.chain { " (chained)" } else { "" }
        );
        ExecState::DmaTransfer {
            job: DmaJob {
                list,
                descriptor,
                step: 0,
                phase: DmaPhase::first(descriptor.command),
                latch: 0,
            },
        }
    }

    pub(super) fn dma_transfer(&mut self, mut job: DmaJob) -> ExecState {
        let d = job.descriptor;
        let src = d.source.address_at(job.step, d.modulo);
        let dst = d.dest.address_at(job.step, d.modulo);

        job.phase = match job.phase {
            DmaPhase::Read => {
                self.read_phys(src);
                DmaPhase::Write
            }
            DmaPhase::Write => {
                self.write_phys(dst, self.input.data);
                self.advance(&mut job, DmaPhase::Read)
            }
            DmaPhase::Fill => {
                self.write_phys(dst, d.fill_byte());
                self.advance(&mut job, DmaPhase::Fill)
            }
            DmaPhase::SwapReadSource => {
                self.read_phys(src);
                DmaPhase::SwapReadDest
            }
            DmaPhase::SwapReadDest => {
                job.latch = self.input.data;
                self.read_phys(dst);
                DmaPhase::SwapWriteDest
            }
            DmaPhase::SwapWriteDest => {
                let dest_byte = self.input.data;
                self.write_phys(dst, job.latch);
                job.latch = dest_byte;
                DmaPhase::SwapWriteSource
            }
            DmaPhase::SwapWriteSource => {
                self.write_phys(src, job.latch);
                self.advance(&mut job, DmaPhase::SwapReadSource)
            }
            DmaPhase::Finish => return self.dma_finish(job),
        };
        ExecState::DmaTransfer { job }
    }

    fn advance(&self, job: &mut DmaJob, again: DmaPhase) -> DmaPhase {
        job.step += 1;
        if job.step >= job.descriptor.length() {
            DmaPhase::Finish
        } else {
            again
        }
    }

    fn dma_finish(&mut self, job: DmaJob) -> ExecState {
        if job.descriptor.chain {
            let list = (job.list + DMA_LIST_LEN as u32) & PHYS_MASK;
            self.read_phys(list);
            return ExecState::DmaListRead {
                list,
                index: 0,
                bytes: [0; DMA_LIST_LEN],
            };
        }
        debug!("DMA job complete");
        self.event = Some(CycleEvent::DmaCompleted);
        ExecState::InstructionFetch
    }
}
