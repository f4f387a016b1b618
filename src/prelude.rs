pub use crate::executor::{JoinHandle, Task};
pub use crate::signal::SimObject;
pub use crate::sim_if::{SimError, SimIf, SIM_IF};
pub use crate::tb_obj::{TbObj, TbObjSafe};
pub use crate::testbench::Scoreboard;
pub use crate::trigger::Trigger;
pub use crate::value::Val;
pub use crate::{fail_test, pass_test, TbResult};
pub use crate::{testbench, utils};
pub use futures::future::FutureExt;
