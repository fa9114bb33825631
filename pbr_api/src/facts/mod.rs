//! The storage fact model (§3): the serializable description of a system's
//! disks, partitions, MD arrays, LUKS containers, LVM stack, and mount
//! table, plus the scalar `Misc` record. Ownership and lifecycle follow §3
//! exactly: disks own partitions, the LVM triad is rooted at the Vg, and
//! mounts reference devices by path only — the Fact Rewriter is the sole
//! mutator of those references.

pub mod device_type;
pub mod disk;
pub mod factset;
pub mod luks;
pub mod lvm;
pub mod md;
pub mod misc;
pub mod mount;
pub mod partition;

pub use device_type::DeviceType;
pub use disk::{Disk, LeafFilesystem};
pub use factset::{FactDocuments, FactSet, FACT_FILES};
pub use luks::{LuksBackingKind, LuksContainer};
pub use lvm::{Lv, LvmReport, Pv, Vg};
pub use md::MdArray;
pub use misc::{EfiInfo, Misc};
pub use mount::Mount;
pub use partition::{Partition, PartitionFlag, PartitionFlagSet, PartitionKind, PartitionTableType};
