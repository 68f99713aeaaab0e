// welcome module initialization file
