use std::io::Read;

use brkalloc::Allocator;
use libc::sbrk;

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`,
/// `gdb`, or just visually track how the program break moves.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn main() {
  let mut allocator = Allocator::sbrk();

  print_program_break("start");
  println!("{}", allocator.dump());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Six blocks back to back. Each one grows the heap.
  // --------------------------------------------------------------------
  let sizes = [100, 200, 150, 300, 50, 170];
  let mut blocks = [std::ptr::null_mut::<u8>(); 6];

  for (slot, size) in blocks.iter_mut().zip(sizes) {
    *slot = allocator.allocate(size).expect("heap growth failed").as_ptr();
    println!("[1] allocate({size}) = {:?}", *slot);
  }

  print_program_break("after six allocations");
  println!("{}", allocator.dump());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Free the 100, 150 and 50 byte blocks, leaving three holes.
  // --------------------------------------------------------------------
  unsafe {
    for index in [0, 2, 4] {
      allocator.free(blocks[index]).expect("free failed");
      println!("[2] free({:?})", blocks[index]);
    }
  }

  println!("{}", allocator.dump());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Allocate 60 bytes: best fit picks the smallest hole that fits and
  //    splits it, without moving the program break.
  // --------------------------------------------------------------------
  print_program_break("before best fit");
  blocks[0] = allocator.allocate(60).expect("allocation failed").as_ptr();
  println!("[3] allocate(60) = {:?}", blocks[0]);
  print_program_break("after best fit");
  println!("{}", allocator.dump());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Free everything. Holes merge with their neighbours and the last
  //    block hands the whole heap back to the OS.
  // --------------------------------------------------------------------
  unsafe {
    for index in [1, 3, 0, 5] {
      allocator.free(blocks[index]).expect("free failed");
      println!("[4] free({:?})", blocks[index]);
      println!("{}", allocator.dump());
    }
  }

  print_program_break("end");
  println!("\n[5] Heap size is back to {} bytes.", allocator.heap_size());
}
