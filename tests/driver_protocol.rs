//! TMC260 protocol tests against a simulated chip.

mod common;

use common::{FakeOutput, FakeTmc260, NoDelay};

use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
use proptest::prelude::*;

use tilt_stepper::config::{DriverSettings, TransportConfig};
use tilt_stepper::driver::{
    BusPort, ChopConf, DrvConf, DrvCtrlDirect, DrvCtrlStepDir, Register, RegisterValue, SgcsConf,
    SmartEn, StatusKind, StatusPayload, Tmc260,
};
use tilt_stepper::error::{ProtocolError, TransportWait};
use tilt_stepper::Microsteps;

fn driver(chip: &FakeTmc260, cs: &FakeOutput) -> Tmc260<FakeTmc260, FakeOutput, NoDelay> {
    Tmc260::new(chip.clone(), cs.clone(), NoDelay, TransportConfig::default())
}

// =============================================================================
// Bring-up
// =============================================================================

#[test]
fn test_bring_up_writes_registers_in_order() {
    let chip = FakeTmc260::new();
    let cs = FakeOutput::new();
    let mut tmc = driver(&chip, &cs);

    tmc.bring_up(&DriverSettings::default(), Microsteps::SIXTY_FOURTH)
        .unwrap();

    assert_eq!(
        chip.datagrams(),
        vec![0xE0000, 0x00102, 0x84044, 0xA0200, 0xD3F05]
    );
    assert!(cs.is_high(), "chip select released after every datagram");
}

#[test]
fn test_bring_up_fills_shadow() {
    let chip = FakeTmc260::new();
    let cs = FakeOutput::new();
    let mut tmc = driver(&chip, &cs);

    tmc.bring_up(&DriverSettings::default(), Microsteps::SIXTEENTH)
        .unwrap();

    let shadow = tmc.shadow();
    assert_eq!(shadow.get(Register::DrvConf), 0xE0000);
    // MRES = 4 for 16 microsteps
    assert_eq!(shadow.get(Register::DrvCtrl), 0x00104);
    assert_eq!(shadow.get(Register::ChopConf), 0x84044);
    assert_eq!(shadow.get(Register::SmartEn), 0xA0200);
    assert_eq!(shadow.get(Register::SgcsConf), 0xD3F05);
}

#[test]
fn test_direct_phase_mode() {
    let chip = FakeTmc260::new();
    let cs = FakeOutput::new();
    let mut tmc = driver(&chip, &cs);

    tmc.write_fields(&DrvConf {
        sdoff: 1,
        ..DrvConf::default()
    })
    .unwrap();
    tmc.write_fields(&DrvCtrlDirect {
        pha_dir: 1,
        pha_cur: 0xFF,
        phb_dir: 0,
        phb_cur: 0x80,
    })
    .unwrap();

    assert_eq!(chip.datagrams(), vec![0xE0080, 0x3FE80]);
    assert_eq!(
        DrvCtrlDirect::unpack(tmc.shadow().get(Register::DrvCtrl)).pha_cur,
        0xFF
    );
}

#[test]
fn test_invalid_field_rejected_before_traffic() {
    let chip = FakeTmc260::new();
    let cs = FakeOutput::new();
    let mut tmc = driver(&chip, &cs);

    let chopconf = ChopConf {
        toff: 16,
        ..ChopConf::default()
    };

    assert_eq!(
        tmc.write_fields(&chopconf),
        Err(ProtocolError::InvalidField {
            register: Register::ChopConf,
            field: "TOFF",
            value: 16,
            width: 4,
        })
    );
    assert!(chip.datagrams().is_empty());
    assert_eq!(cs.writes.get(), 0);
    assert_eq!(tmc.shadow().get(Register::ChopConf), 0);
}

// =============================================================================
// Status reads
// =============================================================================

#[test]
fn test_status_read_is_two_phase() {
    let chip = FakeTmc260::new();
    {
        let mut state = chip.state.borrow_mut();
        state.microstep = 0x155;
        state.stall_guard = 0x2AB;
        state.flags = 0x80;
        // Chip was last told to report stallGuard
        state.rdsel = 1;
    }
    let cs = FakeOutput::new();
    let mut tmc = driver(&chip, &cs);

    let reading = tmc.read_status(StatusKind::Position).unwrap();

    // First reply still reflects the old RDSEL; only the second is used
    assert_eq!(chip.datagrams(), vec![0xEF000, 0xEF000]);
    assert_eq!(reading.microstep(), Some(0x155));
    assert!(reading.flags.stst);
    assert!(!reading.flags.has_fault());
}

#[test]
fn test_status_read_stall_guard_and_current() {
    let chip = FakeTmc260::new();
    {
        let mut state = chip.state.borrow_mut();
        state.stall_guard = 0b10101_00000;
        state.current = 0b00111;
        state.flags = 0x02;
    }
    let cs = FakeOutput::new();
    let mut tmc = driver(&chip, &cs);

    let sg = tmc.read_status(StatusKind::StallGuard).unwrap();
    assert_eq!(
        sg.payload,
        StatusPayload::StallGuard {
            stall_guard: 0b10101_00000
        }
    );
    assert!(sg.flags.ot);

    let current = tmc.read_status(StatusKind::Current).unwrap();
    assert_eq!(
        current.payload,
        StatusPayload::Current {
            stall_guard: 0b10101,
            current: 0b00111
        }
    );
    assert_eq!(chip.datagrams(), vec![0xEF010, 0xEF010, 0xEF020, 0xEF020]);
}

#[test]
fn test_status_read_keeps_configured_drvconf() {
    let chip = FakeTmc260::new();
    let cs = FakeOutput::new();
    let mut tmc = driver(&chip, &cs);
    tmc.bring_up(&DriverSettings::default(), Microsteps::SIXTY_FOURTH)
        .unwrap();

    tmc.read_status(StatusKind::Current).unwrap();

    let drvconf = chip.state.borrow().writes_to(Register::DrvConf);
    assert_eq!(drvconf, vec![0xE0000, 0xE0020, 0xE0020]);
    assert_eq!(tmc.shadow().get(Register::DrvConf), 0xE0020);
}

#[test]
fn test_position_read_is_idempotent() {
    let chip = FakeTmc260::new();
    chip.state.borrow_mut().microstep = 0x3FF;
    let cs = FakeOutput::new();
    let mut tmc = driver(&chip, &cs);
    tmc.bring_up(&DriverSettings::default(), Microsteps::SIXTY_FOURTH)
        .unwrap();
    let shadow_before = *tmc.shadow();

    let first = tmc.read_status(StatusKind::Position).unwrap();
    let second = tmc.read_status(StatusKind::Position).unwrap();

    assert_eq!(first, second);
    assert_eq!(*tmc.shadow(), shadow_before);
    // Only DRVCONF traffic, nothing else reprogrammed
    let datagrams = chip.datagrams();
    assert!(datagrams[5..]
        .iter()
        .all(|&d| Register::from_datagram(d) == Register::DrvConf));
}

// =============================================================================
// Transport failures
// =============================================================================

#[test]
fn test_stalled_port_times_out() {
    let chip = FakeTmc260::new();
    chip.state.borrow_mut().stalled = true;
    let cs = FakeOutput::new();
    let transport = TransportConfig {
        poll_limit: 50,
        ..TransportConfig::default()
    };
    let mut tmc = Tmc260::new(chip.clone(), cs.clone(), NoDelay, transport);

    assert_eq!(
        tmc.write_register(Register::SmartEn, 0xA0200),
        Err(ProtocolError::Timeout(TransportWait::TxReady))
    );
    assert!(cs.is_high());
    assert_eq!(tmc.shadow().get(Register::SmartEn), 0);
}

#[test]
fn test_bus_port_over_spi_bus() {
    let expectations = [
        SpiTransaction::transfer_in_place(vec![0x0A], vec![0xAB]),
        SpiTransaction::flush(),
        SpiTransaction::transfer_in_place(vec![0x02], vec![0xCD]),
        SpiTransaction::flush(),
        SpiTransaction::transfer_in_place(vec![0x00], vec![0xE0]),
        SpiTransaction::flush(),
    ];
    let spi = SpiMock::new(&expectations);
    let cs = FakeOutput::new();
    let mut tmc = Tmc260::new(BusPort::new(spi), cs.clone(), NoDelay, TransportConfig::default());

    tmc.write_fields(&SmartEn::default()).unwrap();
    assert_eq!(tmc.shadow().get(Register::SmartEn), 0xA0200);

    let (port, _, _) = tmc.release();
    port.release().done();
}

// =============================================================================
// Register packing
// =============================================================================

fn check_roundtrip<R>(value: R) -> Result<(), TestCaseError>
where
    R: RegisterValue + PartialEq + std::fmt::Debug,
{
    let raw = value
        .pack()
        .map_err(|e| TestCaseError::fail(format!("{:?} rejected: {:?}", value, e)))?;
    let base = R::REGISTER.base();

    prop_assert!(raw <= 0xFFFFF, "{:#x} wider than a datagram", raw);
    prop_assert_eq!(Register::from_datagram(raw), R::REGISTER);
    prop_assert_eq!(raw & base, base);
    prop_assert_eq!(R::unpack(raw), value);
    Ok(())
}

prop_compose! {
    fn drvctrl_step_dir()(intpol in 0u8..2, dedge in 0u8..2, mres in 0u8..16) -> DrvCtrlStepDir {
        DrvCtrlStepDir { intpol, dedge, mres }
    }
}

prop_compose! {
    fn drvctrl_direct()(
        pha_dir in 0u8..2,
        pha_cur in any::<u8>(),
        phb_dir in 0u8..2,
        phb_cur in any::<u8>(),
    ) -> DrvCtrlDirect {
        DrvCtrlDirect { pha_dir, pha_cur, phb_dir, phb_cur }
    }
}

prop_compose! {
    fn chopconf()(
        tbl in 0u8..4,
        chm in 0u8..2,
        rndtf in 0u8..2,
        hdec in 0u8..4,
        hend in 0u8..16,
        hstrt in 0u8..8,
        toff in 0u8..16,
    ) -> ChopConf {
        ChopConf { tbl, chm, rndtf, hdec, hend, hstrt, toff }
    }
}

prop_compose! {
    fn smarten()(
        seimin in 0u8..2,
        sedn in 0u8..4,
        semax in 0u8..16,
        seup in 0u8..4,
        semin in 0u8..16,
    ) -> SmartEn {
        SmartEn { seimin, sedn, semax, seup, semin }
    }
}

prop_compose! {
    fn sgcsconf()(sfilt in 0u8..2, sgt in 0u8..128, cs in 0u8..32) -> SgcsConf {
        SgcsConf { sfilt, sgt, cs }
    }
}

prop_compose! {
    fn drvconf()(
        tst in 0u8..2,
        slph in 0u8..4,
        slpl in 0u8..4,
        diss2g in 0u8..2,
        ts2g in 0u8..4,
        sdoff in 0u8..2,
        vsense in 0u8..2,
        rdsel in 0u8..4,
    ) -> DrvConf {
        DrvConf { tst, slph, slpl, diss2g, ts2g, sdoff, vsense, rdsel }
    }
}

proptest! {
    #[test]
    fn prop_drvctrl_step_dir_roundtrip(value in drvctrl_step_dir()) {
        check_roundtrip(value)?;
    }

    #[test]
    fn prop_drvctrl_direct_roundtrip(value in drvctrl_direct()) {
        check_roundtrip(value)?;
    }

    #[test]
    fn prop_chopconf_roundtrip(value in chopconf()) {
        check_roundtrip(value)?;
    }

    #[test]
    fn prop_smarten_roundtrip(value in smarten()) {
        check_roundtrip(value)?;
    }

    #[test]
    fn prop_sgcsconf_roundtrip(value in sgcsconf()) {
        check_roundtrip(value)?;
    }

    #[test]
    fn prop_drvconf_roundtrip(value in drvconf()) {
        check_roundtrip(value)?;
        // RDSEL lands where the status read expects it
        prop_assert_eq!((value.pack().unwrap() >> 4) & 0b11, value.rdsel as u32);
    }

    #[test]
    fn prop_oversized_current_scale_rejected(cs in 32u8..=255) {
        let value = SgcsConf { cs, ..SgcsConf::default() };
        let rejected = matches!(
            value.pack(),
            Err(ProtocolError::InvalidField { field: "CS", .. })
        );
        prop_assert!(rejected);
    }
}
