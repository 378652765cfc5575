// End-to-end native calls through the public API with a recording host.

use gta_native::host::{FixedVersion, MemoryIo, NativeInvoker};
use gta_native::value::NativeSlot;
use gta_native::{Error, GameVersion, Hash, NativeWord, OutputArgument, Runtime, TypedValue, ValueKind, Vector3};
use std::ffi::{c_char, CStr};
use std::sync::{Arc, Mutex};

const HASH_X: Hash = Hash(0xDEAD_BEEF_0000_0001);

type Log = Arc<Mutex<Vec<(u64, Vec<NativeWord>)>>>;

struct RecordingHost {
    log: Log,
    result: Option<NativeSlot>,
    strings_seen: Arc<Mutex<Vec<String>>>,
}

impl NativeInvoker for RecordingHost {
    fn invoke(&self, hash: u64, args: &[NativeWord]) -> Option<NativeSlot> {
        self.log.lock().unwrap().push((hash, args.to_vec()));
        // Strings must be readable while the native runs.
        if let Some(w) = args.get(1) {
            if w.0 > 0x10000 {
                let text = unsafe { CStr::from_ptr(w.0 as usize as *const c_char) };
                self.strings_seen.lock().unwrap().push(text.to_string_lossy().into_owned());
            }
        }
        self.result
    }
}

struct NoMemory;

impl MemoryIo for NoMemory {
    fn read_u8(&self, _: usize) -> u8 { 0 }
    fn write_u8(&self, _: usize, _: u8) {}
    fn read_i32(&self, _: usize) -> i32 { 0 }
    fn write_i32(&self, _: usize, _: i32) {}
    fn read_f32(&self, _: usize) -> f32 { 0.0 }
    fn write_f32(&self, _: usize, _: f32) {}
    fn read_u64(&self, _: usize) -> u64 { 0 }
    fn write_u64(&self, _: usize, _: u64) {}
}

fn runtime(result: Option<NativeSlot>) -> (Runtime, Log, Arc<Mutex<Vec<String>>>) {
    let log = Log::default();
    let strings = Arc::new(Mutex::new(Vec::new()));
    let host = RecordingHost { log: log.clone(), result, strings_seen: strings.clone() };
    let rt = Runtime::new(host, NoMemory, FixedVersion(GameVersion::V1_0_2060_0_STEAM));
    (rt, log, strings)
}

#[test]
fn int_call_with_mixed_arguments() {
    let (rt, log, strings) = runtime(Some([NativeWord(0x2A), NativeWord::ZERO, NativeWord::ZERO]));

    let v: i32 = unsafe { rt.call(HASH_X, &[5i32.into(), "abc".into(), true.into()]) }.unwrap();
    assert_eq!(v, 42);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    let (hash, words) = &log[0];
    assert_eq!(*hash, HASH_X.0);
    assert_eq!(words.len(), 3);
    assert_eq!(words[0], NativeWord(5));
    assert_ne!(words[1], NativeWord::ZERO);
    assert_eq!(words[2], NativeWord(1));
    assert_eq!(strings.lock().unwrap().as_slice(), ["abc"]);
}

#[test]
fn pinned_strings_outlive_the_call() {
    let (rt, log, _) = runtime(Some([NativeWord::ZERO; 3]));
    rt.invoke(HASH_X, &[0i32.into(), "kept".into()]).unwrap();
    let ptr = log.lock().unwrap()[0].1[1].0 as usize as *const c_char;
    let text = unsafe { CStr::from_ptr(ptr) };
    assert_eq!(text.to_str().unwrap(), "kept");
}

#[test]
fn wrong_thread_is_reported_for_every_call_form() {
    let (rt, _, _) = runtime(None);
    assert_eq!(unsafe { rt.call::<i32>(HASH_X, &[]) }, Err(Error::WrongThread));
    assert_eq!(unsafe { rt.call::<Vector3>(HASH_X, &[]) }.err(), Some(Error::WrongThread));
    assert_eq!(rt.invoke(HASH_X, &[]), Err(Error::WrongThread));
    assert_eq!(unsafe { rt.call_as(HASH_X, &[], ValueKind::Bool) }, Err(Error::WrongThread));
}

#[test]
fn runtime_kind_decode() {
    let (rt, _, _) = runtime(Some([NativeWord(u64::MAX), NativeWord::ZERO, NativeWord::ZERO]));
    let v = unsafe { rt.call_as(HASH_X, &[], ValueKind::Int(gta_native::value::IntKind::I16)) }.unwrap();
    assert_eq!(v, TypedValue::I16(-1));
}

#[test]
fn output_argument_survives_until_released() {
    let (rt, log, _) = runtime(Some([NativeWord(1), NativeWord::ZERO, NativeWord::ZERO]));
    let mut out = OutputArgument::new();
    let hit: bool = unsafe { rt.call(HASH_X, &[7i32.into(), (&mut out).into()]) }.unwrap();
    assert!(hit);

    let slot_addr = log.lock().unwrap()[0].1[1].0 as usize as *mut NativeWord;
    unsafe { *slot_addr = NativeWord::from_f32(9.5) };
    assert_eq!(unsafe { out.result::<f32>() }, Ok(9.5));

    out.release();
    out.release();
    assert_eq!(unsafe { out.result::<f32>() }, Err(Error::OutputReleased));
}
